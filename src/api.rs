/// PlaceholderApi
///
/// Builds locators for the remote posts/users API. Holds only the base URL;
/// requests themselves go through a `FetchController`.
#[derive(Clone, Debug)]
pub struct PlaceholderApi {
    base_url: String,
}

impl PlaceholderApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn posts(&self) -> String {
        format!("{}/posts", self.base_url)
    }

    pub fn post(&self, id: u32) -> String {
        format!("{}/posts/{id}", self.base_url)
    }

    pub fn users(&self) -> String {
        format!("{}/users", self.base_url)
    }

    pub fn user(&self, id: u32) -> String {
        format!("{}/users/{id}", self.base_url)
    }
}
