/// Router Module Index
///
/// Splits the pages by access requirement. The route guard middleware is
/// layered over the whole router and decides by path prefix; the protected
/// module only collects the pages that sit under a protected prefix.

/// Pages any visitor may load.
pub mod public;

/// Pages behind the session check (`/profile`).
pub mod protected;
