use secrecy::SecretString;

#[derive(Clone)]
pub struct GlobalArgs {
    pub frontend_url: String,
    pub db_username: Option<String>,
    pub db_password: Option<SecretString>,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(frontend_url: String) -> Self {
        Self {
            frontend_url,
            db_username: None,
            db_password: None,
        }
    }

    pub fn set_db_credentials(&mut self, username: String, password: SecretString) {
        self.db_username = Some(username);
        self.db_password = Some(password);
    }
}

impl std::fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("frontend_url", &self.frontend_url)
            .field("db_username", &self.db_username)
            .field("db_password", &"***")
            .finish()
    }
}
