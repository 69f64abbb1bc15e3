pub mod pdf_text;

use std::path::Path;

pub const PDF_EXTENSION: &str = "pdf";

/// Whether a file name carries the `.pdf` extension (case-insensitive).
pub fn has_pdf_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PDF_EXTENSION))
}

/// Whether an uploaded file name is a bare name that cannot escape the staging directory.
pub fn is_plain_file_name(file_name: &str) -> bool {
    let path = Path::new(file_name);
    !file_name.is_empty()
        && !file_name.contains(['/', '\\'])
        && path.file_name().is_some_and(|name| name == path.as_os_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_extension_detection() {
        assert!(has_pdf_extension("reference.pdf"));
        assert!(has_pdf_extension("Scan.PDF"));
        assert!(!has_pdf_extension("doc.txt"));
        assert!(!has_pdf_extension("pdf"));
        assert!(!has_pdf_extension("archive.pdf.zip"));
    }

    #[test]
    fn plain_file_names_only() {
        assert!(is_plain_file_name("v2 final.pdf"));
        assert!(!is_plain_file_name("../escape.pdf"));
        assert!(!is_plain_file_name("nested/dir.pdf"));
        assert!(!is_plain_file_name("..\\windows.pdf"));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name(""));
    }
}
