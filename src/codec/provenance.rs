//! Whole-file provenance attributes, written once per input container.

use chrono::Local;

use crate::container::Container;

pub const FILE_MAJOR_VERSION: &str = "1";
pub const FILE_MINOR_VERSION: &str = "2";

/// The attributes the solver expects at the root of an input file.
pub fn input_file_attrs() -> Vec<(&'static str, String)> {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());
    let file_description = format!(
        "Input data created by {} running Rust on {} {}",
        user,
        std::env::consts::ARCH,
        std::env::consts::OS
    );

    vec![
        ("created_by", format!("Rust kwave-core {}", crate::VERSION)),
        (
            "creation_date",
            Local::now().format("%d-%b-%Y-%H-%M-%S").to_string(),
        ),
        ("file_description", file_description),
        ("file_type", "input".to_string()),
        ("major_version", FILE_MAJOR_VERSION.to_string()),
        ("minor_version", FILE_MINOR_VERSION.to_string()),
    ]
}

pub fn write_input_file_attrs(container: &mut Container) {
    for (key, value) in input_file_attrs() {
        container.set_attr(key, value);
    }
}
