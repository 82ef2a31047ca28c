//! FFI interface for C/C++ callers
//!
//! Documents go in as raw bytes, records come back as JSON strings. Every
//! result must be released with `free_job_result`.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::ParserConfig;
use crate::pipeline::{build_record, parse_document};
use crate::record::FieldMap;

/// Result struct returned across the C boundary.
/// Both pointers are owned by Rust and must be freed via `free_job_result`.
#[repr(C)]
pub struct JobResultFFI {
    /// JSON-serialized result (null-terminated), or null on failure
    pub json_ptr: *mut c_char,
    /// Error message (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

/// Parse one posting page into a normalized record (JSON object).
///
/// # Arguments
/// * `html_ptr` - Pointer to the document bytes (UTF-8, not necessarily null-terminated)
/// * `html_len` - Length of the document in bytes
/// * `source_url` - Page URL recorded as provenance (null-terminated), may be null
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `source_url` must be null or a valid null-terminated C string
/// - Caller must free the result via `free_job_result`
#[no_mangle]
pub unsafe extern "C" fn parse_job_html(
    html_ptr: *const c_char,
    html_len: usize,
    source_url: *const c_char,
) -> JobResultFFI {
    let body: &[u8] = if html_ptr.is_null() || html_len == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(html_ptr as *const u8, html_len)
    };

    let url = if source_url.is_null() {
        None
    } else {
        match CStr::from_ptr(source_url).to_str() {
            Ok(s) => Some(s),
            Err(_) => return make_error_result("Invalid UTF-8 in source URL"),
        }
    };

    match parse_document(body, url, &ParserConfig::default()) {
        Ok(record) => make_json_result(&record),
        Err(e) => make_error_result(&e.to_string()),
    }
}

/// Normalize a JSON array of loosely-typed posting objects.
///
/// Returns a JSON array with one record per input object. Fails only when
/// the input is not a JSON array of objects.
///
/// # Safety
/// - `records_json` must be a valid null-terminated C string
/// - Caller must free the result via `free_job_result`
#[no_mangle]
pub unsafe extern "C" fn parse_jobs_bulk(records_json: *const c_char) -> JobResultFFI {
    if records_json.is_null() {
        return make_error_result("Records JSON is null");
    }
    let input = match CStr::from_ptr(records_json).to_str() {
        Ok(s) => s,
        Err(_) => return make_error_result("Invalid UTF-8 in records JSON"),
    };

    let records: Vec<Map<String, Value>> = match serde_json::from_str(input) {
        Ok(r) => r,
        Err(e) => return make_error_result(&format!("Failed to parse records JSON: {}", e)),
    };

    let config = ParserConfig::default();
    let parsed: Vec<_> = records
        .iter()
        .map(|r| build_record(FieldMap::from_json(r), &config))
        .collect();
    make_json_result(&parsed)
}

/// Free a `JobResultFFI` returned by this library.
///
/// # Safety
/// - `result` must have been returned by `parse_job_html` or `parse_jobs_bulk`
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn free_job_result(result: JobResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

fn make_json_result<T: Serialize>(value: &T) -> JobResultFFI {
    match serde_json::to_string(value) {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => JobResultFFI {
                json_ptr: cstr.into_raw(),
                error_ptr: ptr::null_mut(),
            },
            Err(_) => make_error_result("Result JSON contains null bytes"),
        },
        Err(e) => make_error_result(&format!("Failed to serialize result: {}", e)),
    }
}

fn make_error_result(msg: &str) -> JobResultFFI {
    // Interior NULs would truncate the message on the C side anyway
    let error_cstr = CString::new(msg.replace('\0', " ")).unwrap_or_default();
    JobResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr: error_cstr.into_raw(),
    }
}
