use crate::response::Response;

#[rocket::catch(404)]
pub async fn root_404(req: &rocket::Request<'_>) -> Response {
    use {
        rocket::{
            http::{ContentType, Status},
            outcome::Outcome,
            request::FromRequest as _,
        },
        rocket_client_addr::ClientAddr,
    };

    let addr_string = if let Outcome::Success(addr) = ClientAddr::from_request(req).await {
        addr.get_ipv4_string()
            .unwrap_or_else(|| addr.get_ipv6_string())
    } else {
        "UNKNOWN ADDRESS".to_string()
    };

    warn!(
        "[{addr_string}] has hit a 404 with {} at {} {}",
        req.method(),
        req.uri(),
        req.content_type()
            .map(|t| format!("({t})"))
            .unwrap_or_default()
    );

    // No redirect, the relay has to see a failing status
    Response::builder()
        .with_status(Status::NotFound)
        .with_content("404")
        .with_content_type(ContentType::Text)
        .build()
}
