pub mod config;
pub mod db;
pub mod error;
pub mod router;
pub mod state;

pub mod crypto {
    pub mod seal;
    pub mod token;
}

pub mod models {
    pub mod apikey;
    pub mod role;
    pub mod session;
    pub mod user;
}

pub mod repositories {
    pub mod apikey;
    pub mod directory;
    pub mod memory;
    pub mod session;
    pub mod user;
}

pub mod services {
    pub mod access;
    pub mod apikeys;
    pub mod gate;
    pub mod lock;
    pub mod users;
}

pub mod handlers {
    pub mod access;
    pub mod apikeys;
    pub mod envelope;
    pub mod users;
}

pub mod validation {
    pub mod requests;
}
