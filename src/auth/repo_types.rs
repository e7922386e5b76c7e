use serde::{Deserialize, Serialize};

/// User record in the `users` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,       // client-generated, opaque
    pub fullname: String,
    pub email: String,
    pub password: String, // stored and compared as typed
}
