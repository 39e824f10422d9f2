pub mod domain {
    pub mod backend;
    pub mod error;
    pub mod forms;
    pub mod validation;
}

pub mod application {
    pub mod auth_service;
}

pub mod infrastructure {
    pub mod backend_client;
    pub mod config;
    pub mod logging;
}

pub mod presentation {
    pub mod handlers;
    pub mod middleware;
    pub mod registration_form;
}
