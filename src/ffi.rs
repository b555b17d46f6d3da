//! C FFI — bridges [`PronunciationScorer`] to iOS / Android callers.
//!
//! Functions are `#[no_mangle] extern "C"` so Swift / Kotlin can call them
//! through a thin bridging header without any Objective-C wrapper.
//!
//! ## Memory contract
//!
//! | Function                  | Caller frees with          |
//! |---------------------------|----------------------------|
//! | [`gopscore_scorer_load`]  | [`gopscore_scorer_free`]   |
//! | [`gopscore_score_json`]   | [`gopscore_free_string`]   |
//!
//! Scoring failures (bad arguments, malformed token JSON) come back as a JSON
//! object `{"error": "..."}` rather than a null pointer, so callers can always
//! parse the result.

use std::ffi::{c_char, CStr, CString};
use std::path::Path;

use anyhow::Context;
use tracing::error;

use crate::scorer::{PronunciationScorer, ScoreOptions};

// ─────────────────────────────────────────────────────────────────────────────

/// Opaque handle to a loaded scorer.
pub struct GopScorerHandle {
    scorer: PronunciationScorer,
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Convert a `*const c_char` to an owned `String`; `None` if `ptr` is null.
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}

/// Heap-allocate an owned C string.  Returns null on interior nul bytes.
fn to_c_str(s: &str) -> *const c_char {
    match CString::new(s) {
        Ok(cs) => cs.into_raw(),
        Err(_) => std::ptr::null(),
    }
}

fn error_json(message: &str) -> *const c_char {
    to_c_str(&serde_json::json!({ "error": message }).to_string())
}

fn score_request(
    scorer: &PronunciationScorer,
    script: &str,
    tokens_json: &str,
    options_json: Option<&str>,
) -> anyhow::Result<String> {
    let tokens: Vec<String> = serde_json::from_str(tokens_json).context("tokens must be a JSON array of strings")?;
    let opts: ScoreOptions = match options_json {
        Some(json) if !json.trim().is_empty() => serde_json::from_str(json).context("invalid options JSON")?,
        _ => ScoreOptions::default(),
    };
    let result = scorer.score(script, &tokens, &opts);
    Ok(result.to_json()?)
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Load a scorer from disk.
///
/// @param data_path  UTF-8 path to `ipa_data.json`, or `NULL` to use the
///                   default search path (`$GOPSCORE_DATA`, `./data/`).
/// @param dict_path  UTF-8 path to a CMU-format dictionary, or `NULL` for none.
/// @return           Opaque scorer handle, or `NULL` on failure (details are
///                   logged). Free with [`gopscore_scorer_free`].
#[no_mangle]
pub unsafe extern "C" fn gopscore_scorer_load(
    data_path: *const c_char,
    dict_path: *const c_char,
) -> *mut GopScorerHandle {
    let data = unsafe { cstr_to_string(data_path) };
    let dict = unsafe { cstr_to_string(dict_path) };

    match PronunciationScorer::from_paths(data.as_deref().map(Path::new), dict.as_deref().map(Path::new)) {
        Ok(scorer) => Box::into_raw(Box::new(GopScorerHandle { scorer })),
        Err(e) => {
            error!("gopscore_scorer_load: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Score a decoded token stream against a script.
///
/// @param scorer        Handle from [`gopscore_scorer_load`].
/// @param script        UTF-8 reference text.
/// @param tokens_json   JSON array of decoder tokens, e.g. `["▁kæt","▁dɔɡ"]`.
/// @param options_json  JSON [`ScoreOptions`] (every field optional), or `NULL`.
/// @return              Heap-allocated UTF-8 JSON: the score report, or
///                      `{"error": "..."}`. Free with [`gopscore_free_string`].
#[no_mangle]
pub unsafe extern "C" fn gopscore_score_json(
    scorer: *const GopScorerHandle,
    script: *const c_char,
    tokens_json: *const c_char,
    options_json: *const c_char,
) -> *const c_char {
    if scorer.is_null() {
        return error_json("null scorer handle");
    }
    let (Some(script), Some(tokens)) = (
        unsafe { cstr_to_string(script) },
        unsafe { cstr_to_string(tokens_json) },
    ) else {
        return error_json("null argument (script or tokens_json)");
    };
    let options = unsafe { cstr_to_string(options_json) };

    let h = unsafe { &*scorer };
    match score_request(&h.scorer, &script, &tokens, options.as_deref()) {
        Ok(json) => to_c_str(&json),
        Err(e) => error_json(&format!("{e:#}")),
    }
}

/// Free a string returned by [`gopscore_score_json`].
#[no_mangle]
pub unsafe extern "C" fn gopscore_free_string(s: *const c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s as *mut c_char) });
    }
}

/// Destroy a scorer handle and release all resources.
#[no_mangle]
pub unsafe extern "C" fn gopscore_scorer_free(scorer: *mut GopScorerHandle) {
    if !scorer.is_null() {
        drop(unsafe { Box::from_raw(scorer) });
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::tests::TEST_DATA;
    use std::io::Write;

    unsafe fn take_string(ptr: *const c_char) -> String {
        assert!(!ptr.is_null());
        let s = unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned();
        unsafe { gopscore_free_string(ptr) };
        s
    }

    fn fixture_files() -> (tempfile::NamedTempFile, tempfile::NamedTempFile) {
        let mut data = tempfile::NamedTempFile::new().unwrap();
        data.write_all(TEST_DATA.as_bytes()).unwrap();
        let mut dict = tempfile::NamedTempFile::new().unwrap();
        dict.write_all(b"cat K AE1 T\ndog D AO1 G\n").unwrap();
        (data, dict)
    }

    fn c_path(file: &tempfile::NamedTempFile) -> CString {
        CString::new(file.path().to_str().unwrap()).unwrap()
    }

    #[test]
    fn test_load_score_free_round_trip() {
        let (data, dict) = fixture_files();
        let (data_c, dict_c) = (c_path(&data), c_path(&dict));
        let script = CString::new("cat dog").unwrap();
        let tokens = CString::new(r#"["▁kæt", "▁dɔɡ"]"#).unwrap();

        unsafe {
            let handle = gopscore_scorer_load(data_c.as_ptr(), dict_c.as_ptr());
            assert!(!handle.is_null());

            let json = take_string(gopscore_score_json(handle, script.as_ptr(), tokens.as_ptr(), std::ptr::null()));
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(value["overall_score"], 100, "got: {json}");
            assert_eq!(value["words"][1]["word"], "dog");

            gopscore_scorer_free(handle);
        }
    }

    #[test]
    fn test_options_json_is_applied() {
        let (data, dict) = fixture_files();
        let (data_c, dict_c) = (c_path(&data), c_path(&dict));
        let script = CString::new("cat").unwrap();
        let tokens = CString::new("[]").unwrap();
        let options = CString::new(r#"{"model_id": "ffi-test", "parallel": false, "thresholds": [0.1, 0.2]}"#).unwrap();

        unsafe {
            let handle = gopscore_scorer_load(data_c.as_ptr(), dict_c.as_ptr());
            let json = take_string(gopscore_score_json(handle, script.as_ptr(), tokens.as_ptr(), options.as_ptr()));
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(value["metadata"]["model_used"], "ffi-test");
            assert_eq!(value["metadata"]["thresholds"], serde_json::json!([0.1, 0.2]), "got: {json}");
            assert_eq!(value["overall_score"], 0);
            gopscore_scorer_free(handle);
        }
    }

    #[test]
    fn test_bad_tokens_report_error_json() {
        let (data, _dict) = fixture_files();
        let data_c = c_path(&data);
        let script = CString::new("cat").unwrap();
        let tokens = CString::new("not json").unwrap();

        unsafe {
            let handle = gopscore_scorer_load(data_c.as_ptr(), std::ptr::null());
            assert!(!handle.is_null());
            let json = take_string(gopscore_score_json(handle, script.as_ptr(), tokens.as_ptr(), std::ptr::null()));
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert!(value["error"].as_str().unwrap().contains("tokens"), "got: {json}");
            gopscore_scorer_free(handle);
        }
    }

    #[test]
    fn test_null_handles() {
        let missing = CString::new("/nonexistent/ipa_data.json").unwrap();
        unsafe {
            assert!(gopscore_scorer_load(missing.as_ptr(), std::ptr::null()).is_null());
            let json = take_string(gopscore_score_json(std::ptr::null(), std::ptr::null(), std::ptr::null(), std::ptr::null()));
            assert!(json.contains("null scorer handle"));
            gopscore_scorer_free(std::ptr::null_mut());
            gopscore_free_string(std::ptr::null());
        }
    }
}
