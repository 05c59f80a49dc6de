use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::roles::Role;

/// Request body for self-registration. Everything except `facebookId` is
/// mandatory; fields arrive optional so a missing one yields a 400 with the
/// original "All fields are required." message instead of a decode error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub father_name: Option<String>,
    pub educational_qualification: Option<String>,
    pub profession: Option<String>,
    pub village: Option<String>,
    #[serde(rename = "union")]
    pub union_name: Option<String>,
    pub upazila: Option<String>,
    pub district: Option<String>,
    pub election_seat_no: Option<String>,
    pub phone_number: Option<String>,
    pub favorite_party: Option<String>,
    pub facebook_id: Option<String>,
}

impl RegisterRequest {
    pub fn has_all_required_fields(&self) -> bool {
        [
            &self.email,
            &self.password,
            &self.full_name,
            &self.father_name,
            &self.educational_qualification,
            &self.profession,
            &self.village,
            &self.union_name,
            &self.upazila,
            &self.district,
            &self.election_seat_no,
            &self.phone_number,
            &self.favorite_party,
        ]
        .iter()
        .all(|f| f.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }
}

/// Request body for credential sign-in.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Trusted external-identity assertion (OAuth profile). Role is always
/// defaulted to `user`; the assertion is not re-verified here.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OauthRequest {
    pub external_id: String,
    pub email: String,
    pub name: String,
}

/// Public identity returned after sign-in. Never carries the hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: SessionUser,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub user: SessionUser,
}
