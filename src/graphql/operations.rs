//! GraphQL documents consumed by the client.

use serde::{Deserialize, Serialize};

use super::GraphqlOperation;
use crate::auth::Identity;

/// `mutation Login($email)`; returns the access token.
pub struct LoginMutation;

#[derive(Debug, Clone, Serialize)]
pub struct LoginVariables {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    pub login: LoginPayload,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    pub access_token: String,
}

impl GraphqlOperation for LoginMutation {
    type Variables = LoginVariables;
    type ResponseData = LoginData;

    const QUERY: &'static str = r"
        mutation Login($email: String!) {
            login(loginInput: { email: $email }) {
                accessToken
            }
        }
    ";
    const OPERATION_NAME: &'static str = "Login";
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NoVariables {}

/// Lightweight session check: `me { name }`. Only the absence of errors
/// matters, so the payload stays untyped.
pub struct SessionCheckQuery;

impl GraphqlOperation for SessionCheckQuery {
    type Variables = NoVariables;
    type ResponseData = serde_json::Value;

    const QUERY: &'static str = r"
        query Me {
            me {
                name
            }
        }
    ";
    const OPERATION_NAME: &'static str = "Me";
}

/// Full identity query: `me { id name email phone jobTitle timezone avatarUrl }`.
pub struct IdentityQuery;

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityData {
    pub me: Identity,
}

impl GraphqlOperation for IdentityQuery {
    type Variables = NoVariables;
    type ResponseData = IdentityData;

    const QUERY: &'static str = r"
        query Me {
            me {
                id
                name
                email
                phone
                jobTitle
                timezone
                avatarUrl
            }
        }
    ";
    const OPERATION_NAME: &'static str = "Me";
}

/// Offset paging accepted by list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OffsetPaging {
    pub limit: u32,
    pub offset: u32,
}

impl Default for OffsetPaging {
    fn default() -> Self {
        Self {
            limit: 10,
            offset: 0,
        }
    }
}

/// Company list backing the companies page.
pub struct CompaniesQuery;

#[derive(Debug, Clone, Serialize)]
pub struct CompaniesVariables {
    pub paging: OffsetPaging,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompaniesData {
    pub companies: CompanyConnection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyConnection {
    pub total_count: u64,
    pub nodes: Vec<Company>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl GraphqlOperation for CompaniesQuery {
    type Variables = CompaniesVariables;
    type ResponseData = CompaniesData;

    const QUERY: &'static str = r"
        query Companies($paging: OffsetPaging) {
            companies(paging: $paging) {
                totalCount
                nodes {
                    id
                    name
                    avatarUrl
                }
            }
        }
    ";
    const OPERATION_NAME: &'static str = "Companies";
}
