//! Public SDK for apihook.
//!
//! This crate re-exports all apihook functionality:
//!
//! ```ignore
//! use apihook_sdk::prelude::*;
//!
//! let store = AuthStore::builder()
//!     .base_url("https://api.example.com")
//!     .token(token)
//!     .logout(|| redirect_to_login())
//!     .build();
//!
//! let mut users = UseApi::new(
//!     ApiHookOptions::config(RequestDescriptor::new("/users").with_authentication(true))
//!         .store(store)
//!         .run_on_time_of_screen_mount(true)
//!         .debouncing_limit_ms(500),
//! )?;
//!
//! users.activate().await;
//! render(users.data(), users.loading(), users.error());
//! ```

pub use apihook_auth;
pub use apihook_core;
pub use apihook_data;

/// Prelude for convenient imports.
pub mod prelude {
    pub use apihook_auth::*;
    pub use apihook_core::*;
    pub use apihook_data::*;
}
