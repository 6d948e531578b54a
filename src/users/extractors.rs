use axum::{
    body::Body,
    extract::{FromRequest, Multipart, Request},
    http::{header::CONTENT_TYPE, HeaderMap},
    Form,
};
use http_body_util::LengthLimitError;
use tracing::{debug, warn};

use super::dto::RegistrationForm;
use crate::error::RegisterError;

/// Reads the registration fields, preferring a JSON body and falling back to
/// form fields (url-encoded or multipart). A body that yields neither comes
/// back empty, which the presence check then rejects. A body over `limit`
/// is refused outright.
pub async fn read_registration_form(
    request: Request,
    limit: usize,
) -> Result<RegistrationForm, RegisterError> {
    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, limit).await {
        Ok(b) => b,
        Err(e) => {
            let cause = e.into_inner();
            if exceeds_limit(&*cause) {
                warn!(limit, "request body over limit");
                return Err(RegisterError::PayloadTooLarge);
            }
            warn!(error = %cause, "could not read request body");
            return Ok(RegistrationForm::default());
        }
    };

    if is_json(&parts.headers) {
        match serde_json::from_slice::<RegistrationForm>(&bytes) {
            Ok(form) => return Ok(form),
            Err(e) => debug!(error = %e, "json body did not decode; trying form fields"),
        }
    }

    let multipart = is_multipart(&parts.headers);
    let request = Request::from_parts(parts, Body::from(bytes));
    if multipart {
        return Ok(read_multipart(request).await);
    }

    // pairs rather than a struct so a repeated key keeps its first value
    match Form::<Vec<(String, String)>>::from_request(request, &()).await {
        Ok(Form(pairs)) => Ok(RegistrationForm::from_pairs(pairs)),
        Err(rejection) => {
            debug!(%rejection, "no form fields in body");
            Ok(RegistrationForm::default())
        }
    }
}

/// Collects the text parts of a multipart body. File parts are skipped; a
/// malformed body keeps whatever was read before the error.
async fn read_multipart(request: Request) -> RegistrationForm {
    let mut multipart = match Multipart::from_request(request, &()).await {
        Ok(m) => m,
        Err(rejection) => {
            debug!(%rejection, "not a multipart body");
            return RegistrationForm::default();
        }
    };

    let mut pairs = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                debug!(error = %e, "malformed multipart body");
                break;
            }
        };
        if field.file_name().is_some() {
            continue;
        }
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        match field.text().await {
            Ok(value) => pairs.push((name, value)),
            Err(e) => {
                debug!(error = %e, field = %name, "unreadable multipart field");
                break;
            }
        }
    }
    RegistrationForm::from_pairs(pairs)
}

fn exceeds_limit(err: &(dyn std::error::Error + 'static)) -> bool {
    std::iter::successors(Some(err), |e| e.source()).any(|e| e.is::<LengthLimitError>())
}

fn essence(headers: &HeaderMap) -> Option<String> {
    let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    Some(
        content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase(),
    )
}

// application/json or any application/*+json
fn is_json(headers: &HeaderMap) -> bool {
    essence(headers).is_some_and(|essence| {
        essence == "application/json"
            || (essence.starts_with("application/") && essence.ends_with("+json"))
    })
}

fn is_multipart(headers: &HeaderMap) -> bool {
    essence(headers).is_some_and(|essence| essence == "multipart/form-data")
}
