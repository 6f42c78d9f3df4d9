use crate::os_util::PlatformError;

/// Severity of a popup; picks the icon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MessageKind {
    #[default]
    Info,
    Warning,
    Error,
}

/// Something that can show a modal message to the user.
pub trait MessagePopup {
    fn show(&self, title: &str, description: &str, kind: MessageKind) -> Result<(), PlatformError>;
}

/// The host's native message box.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPopup;

/// The popup implementation for the current platform.
pub fn platform_popup() -> SystemPopup {
    SystemPopup
}

#[cfg(windows)]
impl MessagePopup for SystemPopup {
    fn show(&self, title: &str, description: &str, kind: MessageKind) -> Result<(), PlatformError> {
        use windows_sys::Win32::UI::WindowsAndMessaging::{
            MessageBoxW, MB_ICONERROR, MB_ICONINFORMATION, MB_ICONWARNING, MB_OK,
        };

        let icon = match kind {
            MessageKind::Info => MB_ICONINFORMATION,
            MessageKind::Warning => MB_ICONWARNING,
            MessageKind::Error => MB_ICONERROR,
        };
        let title = wide(title);
        let text = wide(description);
        // SAFETY: both buffers are NUL-terminated and outlive the call.
        let rc = unsafe { MessageBoxW(std::ptr::null_mut(), text.as_ptr(), title.as_ptr(), icon | MB_OK) };
        if rc == 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        Ok(())
    }
}

#[cfg(windows)]
fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

#[cfg(not(windows))]
impl MessagePopup for SystemPopup {
    fn show(&self, title: &str, _description: &str, kind: MessageKind) -> Result<(), PlatformError> {
        tracing::debug!(title, ?kind, "no native message box on this platform");
        Err(PlatformError::Unsupported("message popups"))
    }
}
