use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct CreateAdminRequest { pub name: String, pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct AdminProfileDoc { pub id: Uuid, pub name: String, pub email: String }

#[derive(ToSchema)]
pub struct LoginResponseDoc { pub token: String, pub user: AdminProfileDoc }

#[derive(ToSchema)]
pub struct MessageDoc { pub message: String }

#[derive(ToSchema)]
pub struct ErrorDoc { pub error: String, pub message: Option<String> }

/// Multipart body of bus create/update.
#[derive(ToSchema)]
#[allow(non_snake_case)]
pub struct BusFormDoc {
    pub name: Option<String>,
    pub route: Option<String>,
    /// Comma separated, e.g. `X,Y,Z`
    pub stops: Option<String>,
    /// `active` or `inactive`
    pub status: Option<String>,
    pub schedule: Option<String>,
    pub fare: Option<String>,
    /// jpeg/jpg/png, at most 5,000,000 bytes by default
    #[schema(value_type = Option<String>, format = Binary)]
    pub busImage: Option<Vec<u8>>,
}

#[derive(ToSchema)]
#[allow(non_snake_case)]
pub struct BusDoc {
    pub id: Uuid,
    pub name: String,
    pub route: String,
    pub imageUrl: String,
    pub stops: Vec<String>,
    /// `active` or `inactive`
    pub status: String,
    pub schedule: String,
    pub fare: String,
    pub createdAt: String,
    pub updatedAt: String,
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::login,
        crate::routes::auth::create_admin,
        crate::routes::buses::list,
        crate::routes::buses::get,
        crate::routes::buses::create,
        crate::routes::buses::update,
        crate::routes::buses::delete,
    ),
    components(schemas(
        HealthResponse,
        LoginRequest,
        CreateAdminRequest,
        AdminProfileDoc,
        LoginResponseDoc,
        MessageDoc,
        ErrorDoc,
        BusFormDoc,
        BusDoc,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "meta", description = "Health"),
        (name = "auth", description = "Admin login and accounts"),
        (name = "buses", description = "Bus records")
    )
)]
pub struct ApiDoc;
