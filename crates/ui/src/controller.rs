//! Upload form controller: label updates, submission, result rendering.

use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    Document, Element, Event, FormData, HtmlButtonElement, HtmlFormElement, HtmlInputElement,
};

use protoeval_api::{EvaluationReport, ServerReply, UPLOAD_FIELD};

use crate::notify::Notifier;
use crate::upload;

const LABEL_PLACEHOLDER: &str = "Choose File";
const SUBMIT_READY: &str = "Upload and Evaluate";
const SUBMIT_BUSY: &str = "Processing...";
const GENERIC_ERROR: &str =
    "An error occurred while processing the document. Please try again.";

/// Label presentation for a selection: text plus whether the `selected`
/// class applies.
fn label_for_selection(selection: Option<&str>) -> (&str, bool) {
    match selection {
        Some(name) => (name, true),
        None => (LABEL_PLACEHOLDER, false),
    }
}

/// Submit-button text at each end of the Idle -> Processing -> Idle cycle.
fn submit_label(busy: bool) -> &'static str {
    if busy {
        SUBMIT_BUSY
    } else {
        SUBMIT_READY
    }
}

/// The upload page with its element handles injected at construction.
///
/// Handlers close over this struct; nothing does ambient lookups per
/// event.
pub struct UploadPage {
    document: Document,
    file_input: HtmlInputElement,
    label: Element,
    submit_btn: HtmlButtonElement,
    score_out: Element,
    summary_out: Element,
    points_list: Element,
    notifier: Rc<dyn Notifier>,
}

impl UploadPage {
    pub fn from_document(
        document: &Document,
        notifier: Rc<dyn Notifier>,
    ) -> Result<Rc<Self>, JsValue> {
        let file_input = document
            .get_element_by_id("file-upload")
            .ok_or("file input not found")?
            .dyn_into::<HtmlInputElement>()?;
        let submit_btn = document
            .get_element_by_id("upload-evaluate-btn")
            .ok_or("submit button not found")?
            .dyn_into::<HtmlButtonElement>()?;
        let label = document
            .query_selector(".upload-label")?
            .ok_or("upload label not found")?;
        let score_out = document
            .get_element_by_id("overall-score")
            .ok_or("score region not found")?;
        let summary_out = document
            .get_element_by_id("executive-summary")
            .ok_or("summary region not found")?;
        let points_list = document
            .get_element_by_id("improvement-points")
            .ok_or("improvement list not found")?;

        Ok(Rc::new(Self {
            document: document.clone(),
            file_input,
            label,
            submit_btn,
            score_out,
            summary_out,
            points_list,
            notifier,
        }))
    }

    /// Attach the change and submit listeners.
    pub fn bind(self: &Rc<Self>, form: &HtmlFormElement) -> Result<(), JsValue> {
        let page = self.clone();
        let on_change = Closure::wrap(Box::new(move || page.selection_changed()) as Box<dyn FnMut()>);
        self.file_input
            .add_event_listener_with_callback("change", on_change.as_ref().unchecked_ref())?;
        on_change.forget();

        let page = self.clone();
        let on_submit = Closure::wrap(Box::new(move |e: Event| {
            // Keep the browser from navigating; the submission runs as a
            // task on the event loop instead.
            e.prevent_default();
            let page = page.clone();
            spawn_local(page.submit());
        }) as Box<dyn FnMut(Event)>);
        form.add_event_listener_with_callback("submit", on_submit.as_ref().unchecked_ref())?;
        on_submit.forget();

        Ok(())
    }

    /// Sync the label with the current file selection.
    pub fn selection_changed(&self) {
        let name = self
            .file_input
            .files()
            .and_then(|files| files.get(0))
            .map(|file| file.name());
        let (text, selected) = label_for_selection(name.as_deref());

        self.label.set_text_content(Some(text));
        let classes = self.label.class_list();
        let _ = if selected {
            classes.add_1("selected")
        } else {
            classes.remove_1("selected")
        };
    }

    /// One full submission cycle. The ready state comes back on every
    /// exit path: success, server-reported error, and transport failure.
    async fn submit(self: Rc<Self>) {
        self.set_busy(true);

        match self.upload_selection().await {
            Ok(ServerReply::Error(reply)) => {
                self.notifier.notify(&format!("Error: {}", reply.error));
            }
            Ok(ServerReply::Report(report)) => self.render_report(&report),
            Err(err) => {
                web_sys::console::error_2(&"upload failed:".into(), &err);
                self.notifier.notify(GENERIC_ERROR);
            }
        }

        self.set_busy(false);
    }

    async fn upload_selection(&self) -> Result<ServerReply, JsValue> {
        let form = FormData::new()?;
        // With nothing picked the field is simply absent; the host
        // reports that case.
        if let Some(file) = self.file_input.files().and_then(|files| files.get(0)) {
            form.append_with_blob(UPLOAD_FIELD, &file)?;
        }
        upload::post_protocol(&form).await
    }

    fn render_report(&self, report: &EvaluationReport) {
        self.score_out
            .set_text_content(Some(&report.score.to_string()));
        self.summary_out
            .set_text_content(Some(&report.executive_summary));

        // Replace, never accumulate: clear before appending.
        self.points_list.set_inner_html("");
        for point in &report.improvement_points {
            if let Ok(item) = self.document.create_element("li") {
                item.set_text_content(Some(point));
                let _ = self.points_list.append_child(&item);
            }
        }
    }

    fn set_busy(&self, busy: bool) {
        self.submit_btn.set_text_content(Some(submit_label(busy)));
        self.submit_btn.set_disabled(busy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_tracks_selection() {
        assert_eq!(
            label_for_selection(Some("protocol.pdf")),
            ("protocol.pdf", true)
        );
        assert_eq!(label_for_selection(None), ("Choose File", false));
    }

    #[test]
    fn test_label_is_idempotent_for_a_selection() {
        let first = label_for_selection(Some("study.pdf"));
        let second = label_for_selection(Some("study.pdf"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_submit_label_cycle() {
        assert_eq!(submit_label(true), "Processing...");
        assert_eq!(submit_label(false), "Upload and Evaluate");
    }
}
