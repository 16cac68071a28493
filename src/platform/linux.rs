use super::{ActiveApp, ActiveAppSource};
use log::warn;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{Atom, AtomEnum, ConnectionExt, Window};
use x11rb::rust_connection::RustConnection;

/// Reads the focused window's `WM_CLASS` instance name and `_NET_WM_PID` from X11.
pub struct X11Source {
    conn: Option<RustConnection>,
    root: Window,
}

impl Default for X11Source {
    fn default() -> Self {
        Self::new()
    }
}

impl X11Source {
    pub fn new() -> Self {
        match x11rb::connect(None) {
            Ok((conn, screen_num)) => {
                let root = conn.setup().roots.get(screen_num).map(|screen| screen.root);
                match root {
                    Some(root) => Self {
                        conn: Some(conn),
                        root,
                    },
                    None => {
                        warn!("Invalid X11 screen number {screen_num}, active-app lookup disabled");
                        Self { conn: None, root: 0 }
                    }
                }
            }
            Err(e) => {
                // Wayland and headless sessions end up here; every query reports no app.
                warn!("Failed to connect to X server: {e}, active-app lookup disabled");
                Self { conn: None, root: 0 }
            }
        }
    }

    fn get_atom(&self, name: &str) -> Option<Atom> {
        self.conn
            .as_ref()?
            .intern_atom(false, name.as_bytes())
            .ok()?
            .reply()
            .ok()
            .map(|r| r.atom)
    }

    fn get_u32_property(&self, window: Window, atom: Atom, kind: AtomEnum) -> Option<u32> {
        let reply = self
            .conn
            .as_ref()?
            .get_property(false, window, atom, kind, 0, 1)
            .ok()?
            .reply()
            .ok()?;
        let value = reply.value32()?.next();
        value
    }

    fn get_active_window_id(&self) -> Option<Window> {
        let atom = self.get_atom("_NET_ACTIVE_WINDOW")?;
        self.get_u32_property(self.root, atom, AtomEnum::WINDOW)
            .filter(|&window| window != 0)
    }

    fn get_class_instance(&self, window: Window) -> Option<String> {
        let reply = self
            .conn
            .as_ref()?
            .get_property(false, window, AtomEnum::WM_CLASS, AtomEnum::STRING, 0, 1024)
            .ok()?
            .reply()
            .ok()?;

        // WM_CLASS is "instance\0class\0"
        let raw = String::from_utf8(reply.value).ok()?;
        raw.split('\0')
            .next()
            .filter(|instance| !instance.is_empty())
            .map(str::to_string)
    }
}

impl ActiveAppSource for X11Source {
    fn current(&self) -> ActiveApp {
        let Some(window) = self.get_active_window_id() else {
            return ActiveApp::unknown();
        };
        let Some(key) = self.get_class_instance(window) else {
            return ActiveApp::unknown();
        };
        let pid = self
            .get_atom("_NET_WM_PID")
            .and_then(|atom| self.get_u32_property(window, atom, AtomEnum::CARDINAL))
            .unwrap_or(0);

        ActiveApp { key, pid }
    }
}
