mod controller;
mod notify;
mod upload;

use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlFormElement;

use crate::controller::UploadPage;
use crate::notify::AlertNotifier;

#[wasm_bindgen(start)]
pub fn main_js() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().expect("no global `window` exists");
    let document = window.document().expect("should have a document on window");

    let form = document
        .get_element_by_id("upload-form")
        .expect("upload form not found")
        .dyn_into::<HtmlFormElement>()?;

    let page = UploadPage::from_document(&document, Rc::new(AlertNotifier))?;
    page.bind(&form)?;

    // Browsers can restore a selection across reload; sync the label to it.
    page.selection_changed();

    Ok(())
}
