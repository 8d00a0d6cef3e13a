use serde::Deserialize;

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostMessageRequest {
    pub user_id: String,
    pub text: String,
}
