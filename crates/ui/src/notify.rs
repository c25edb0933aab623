use web_sys::window;

/// User-facing notification sink.
///
/// The page surfaces errors through a blocking alert; tests and future
/// toast-style surfaces substitute their own sink.
pub trait Notifier {
    fn notify(&self, message: &str);
}

/// Blocking browser alert.
pub struct AlertNotifier;

impl Notifier for AlertNotifier {
    fn notify(&self, message: &str) {
        if let Some(win) = window() {
            let _ = win.alert_with_message(message);
        }
    }
}
