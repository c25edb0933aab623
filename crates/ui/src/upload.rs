//! Multipart POST to the evaluation endpoint.

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{window, FormData, Request, RequestInit, Response};

use protoeval_api::{ServerReply, UPLOAD_ENDPOINT};

/// POST the form and decode the JSON reply.
///
/// No timeout beyond the browser default, no retry: a failure of any step
/// surfaces through the caller's generic error path.
pub async fn post_protocol(form: &FormData) -> Result<ServerReply, JsValue> {
    let win = window().ok_or("no window")?;

    let opts = RequestInit::new();
    opts.set_method("POST");
    opts.set_body(form.as_ref());

    let request = Request::new_with_str_and_init(UPLOAD_ENDPOINT, &opts)?;
    let response: Response = JsFuture::from(win.fetch_with_request(&request))
        .await?
        .dyn_into()?;

    let body = JsFuture::from(response.text()?).await?;
    let body = body.as_string().ok_or("response body is not text")?;

    ServerReply::from_json(&body).map_err(|e| JsValue::from_str(&e.to_string()))
}
