//! `version`: prints build metadata. Grounded on the teacher's
//! `Command::Version` arm in `gateway/src/main.rs`.

pub fn render_text() -> String {
    format!("rpc {}", env!("CARGO_PKG_VERSION"))
}
