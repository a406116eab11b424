//! FFI bindings for the nudge engine
//!
//! This module provides C-compatible functions for scoring payments from other
//! languages. All functions use C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `nudge_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::{DateTime, Utc};

use crate::error::NudgeError;
use crate::pipeline::{score_to_json, RiskAnalyzer};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Hand a result across the boundary, recording the error on failure
fn finish(result: Result<String, NudgeError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Parse an optional RFC 3339 timestamp; NULL means the current time
unsafe fn parse_now(now_rfc3339: *const c_char) -> Result<DateTime<Utc>, NudgeError> {
    if now_rfc3339.is_null() {
        return Ok(Utc::now());
    }
    let raw = cstr_to_string(now_rfc3339)
        .ok_or_else(|| NudgeError::ParseError("Invalid timestamp string pointer".to_string()))?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| NudgeError::ParseError(format!("Invalid timestamp '{}': {}", raw, e)))
}

// ============================================================================
// Stateless API
// ============================================================================

/// Score `ScoringInput` JSON and return `ScoringResult` JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `nudge_free_string`.
/// - Returns NULL on error; call `nudge_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn nudge_score_json(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    finish(score_to_json(&json_str))
}

/// Assess `PaymentRequest` JSON with the default configuration.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - `now_rfc3339` must be a valid null-terminated C string or NULL for the
///   current time.
/// - Returns a newly allocated string that must be freed with `nudge_free_string`.
/// - Returns NULL on error; call `nudge_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn nudge_assess_json(
    json: *const c_char,
    now_rfc3339: *const c_char,
) -> *mut c_char {
    clear_last_error();
    assess_with(&RiskAnalyzer::default(), json, now_rfc3339)
}

unsafe fn assess_with(
    analyzer: &RiskAnalyzer,
    json: *const c_char,
    now_rfc3339: *const c_char,
) -> *mut c_char {
    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let now = match parse_now(now_rfc3339) {
        Ok(now) => now,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    finish(analyzer.assess_json(&json_str, now))
}

// ============================================================================
// Configured Analyzer API
// ============================================================================

/// Opaque handle to a RiskAnalyzer
pub struct RiskAnalyzerHandle {
    analyzer: RiskAnalyzer,
}

/// Create a RiskAnalyzer from `EngineConfig` JSON, or defaults when NULL.
///
/// # Safety
/// - `config_json` must be a valid null-terminated C string or NULL.
/// - Must be freed with `nudge_analyzer_free`.
/// - Returns NULL on error; call `nudge_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn nudge_analyzer_new(config_json: *const c_char) -> *mut RiskAnalyzerHandle {
    clear_last_error();

    let analyzer = if config_json.is_null() {
        RiskAnalyzer::default()
    } else {
        let json_str = match cstr_to_string(config_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid config string pointer");
                return ptr::null_mut();
            }
        };
        match RiskAnalyzer::from_config_json(&json_str) {
            Ok(analyzer) => analyzer,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    Box::into_raw(Box::new(RiskAnalyzerHandle { analyzer }))
}

/// Free a RiskAnalyzer.
///
/// # Safety
/// - `analyzer` must be a valid pointer returned by `nudge_analyzer_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn nudge_analyzer_free(analyzer: *mut RiskAnalyzerHandle) {
    if !analyzer.is_null() {
        drop(Box::from_raw(analyzer));
    }
}

/// Assess `PaymentRequest` JSON with a configured analyzer.
///
/// # Safety
/// - `analyzer` must be a valid pointer returned by `nudge_analyzer_new`.
/// - `json` must be a valid null-terminated C string.
/// - `now_rfc3339` must be a valid null-terminated C string or NULL.
/// - Returns a newly allocated string that must be freed with `nudge_free_string`.
/// - Returns NULL on error; call `nudge_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn nudge_analyzer_assess(
    analyzer: *const RiskAnalyzerHandle,
    json: *const c_char,
    now_rfc3339: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if analyzer.is_null() {
        set_last_error("Null analyzer pointer");
        return ptr::null_mut();
    }

    assess_with(&(*analyzer).analyzer, json, now_rfc3339)
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by nudge functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a nudge function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn nudge_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next nudge function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn nudge_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the engine version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn nudge_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request_json() -> CString {
        CString::new(
            r#"{
                "amount": 900,
                "category": "SHOPPING",
                "currentBalance": 4000,
                "history": [
                    {"amount": 100, "category": "SHOPPING", "timestamp": "2024-03-01T12:00:00Z"},
                    {"amount": 300, "category": "SHOPPING", "timestamp": "2024-03-08T12:00:00Z"}
                ]
            }"#,
        )
        .unwrap()
    }

    unsafe fn take(ptr: *mut c_char) -> serde_json::Value {
        assert!(!ptr.is_null());
        let value = serde_json::from_str(CStr::from_ptr(ptr).to_str().unwrap()).unwrap();
        nudge_free_string(ptr);
        value
    }

    #[test]
    fn test_ffi_score_json() {
        let json = CString::new(
            r#"{"amount": 5000, "historicalMean": 1000, "historicalStdDev": 500,
                "isLowControlHour": true, "sustainableDailyAllowance": 2000,
                "recentImpulseAlerts": 2}"#,
        )
        .unwrap();

        unsafe {
            let result = take(nudge_score_json(json.as_ptr()));
            assert_eq!(result["impulseIndex"], 85.0);
            assert_eq!(result["riskLevel"], "Critical");
            assert!(nudge_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_assess_json_with_timestamp() {
        let json = sample_request_json();
        let now = CString::new("2024-03-10T23:30:00Z").unwrap();

        unsafe {
            let result = take(nudge_assess_json(json.as_ptr(), now.as_ptr()));
            assert_eq!(result["input"]["isLowControlHour"], true);
            assert_eq!(result["input"]["sustainableDailyAllowance"], 200.0);
            assert_eq!(result["assessedAt"], "2024-03-10T23:30:00Z");
        }
    }

    #[test]
    fn test_ffi_assess_json_defaults_to_now() {
        let json = sample_request_json();
        unsafe {
            let result = take(nudge_assess_json(json.as_ptr(), ptr::null()));
            assert!(result["result"]["impulseIndex"].is_number());
        }
    }

    #[test]
    fn test_ffi_analyzer_lifecycle() {
        let config = CString::new(r#"{"utc_offset_minutes": 330}"#).unwrap();
        let json = sample_request_json();
        // 18:00 UTC is 23:30 at +05:30
        let now = CString::new("2024-03-10T18:00:00Z").unwrap();

        unsafe {
            let analyzer = nudge_analyzer_new(config.as_ptr());
            assert!(!analyzer.is_null());

            let result = take(nudge_analyzer_assess(analyzer, json.as_ptr(), now.as_ptr()));
            assert_eq!(result["input"]["isLowControlHour"], true);

            nudge_analyzer_free(analyzer);
        }
    }

    #[test]
    fn test_ffi_invalid_config() {
        let config = CString::new(r#"{"period_days": 0}"#).unwrap();
        unsafe {
            assert!(nudge_analyzer_new(config.as_ptr()).is_null());
            assert!(!nudge_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid_json = CString::new("not json").unwrap();
            let result = nudge_score_json(invalid_json.as_ptr());
            assert!(result.is_null());

            let error = nudge_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());

            let bad_time = CString::new("yesterday").unwrap();
            let json = sample_request_json();
            assert!(nudge_assess_json(json.as_ptr(), bad_time.as_ptr()).is_null());

            assert!(nudge_score_json(ptr::null()).is_null());
            assert!(nudge_analyzer_assess(ptr::null(), json.as_ptr(), ptr::null()).is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = nudge_version();
            assert!(!version.is_null());
            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
