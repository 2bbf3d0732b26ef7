#![no_main]

use libfuzzer_sys::fuzz_target;
use panedock_dock::{DockLayout, DockOptions, InMemoryWindowHost, PanelOptions};

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    if raw.len() > 16 * 1024 {
        return;
    }

    let options = DockOptions {
        width: 640.0,
        height: 480.0,
        ..DockOptions::default()
    };
    let Ok(mut dock) = DockLayout::with_host(options, InMemoryWindowHost::with_capacity(4)) else {
        return;
    };
    let _ = dock.add_panel(PanelOptions::new("seed", "seed"), None);
    let before = dock.to_json_string().expect("seed layout serializes");

    match dock.from_json_str(raw) {
        // Whatever loads must serialize and load again to the same document.
        Ok(()) => {
            let saved = dock.to_json_string().expect("restored layout serializes");
            let mut again = DockLayout::with_host(
                dock.options().clone(),
                InMemoryWindowHost::with_capacity(4),
            )
            .expect("options were already accepted");
            again.from_json_str(&saved).expect("saved layout reloads");
            assert_eq!(again.to_json_string().expect("reloaded layout serializes"), saved);
        }
        Err(_) => {
            let after = dock.to_json_string().expect("seed layout serializes");
            assert_eq!(after, before, "rejected document changed the layout");
        }
    }
});
