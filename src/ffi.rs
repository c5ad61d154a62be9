//! FFI bindings for the Fitts engine
//!
//! This module provides C-compatible functions for driving a session from a
//! host UI written in another language. Sessions are opaque handles; results
//! are returned as JSON in C strings (null-terminated) that must be freed by
//! the caller using `fitts_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::ExperimentConfig;
use crate::engine::EngineEvent;
use crate::error::FittsError;
use crate::session::Session;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
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

/// Serialize a result as JSON, recording the error on failure
fn json_result<T: serde::Serialize>(result: Result<T, FittsError>) -> *mut c_char {
    match result.and_then(|value| serde_json::to_string(&value).map_err(FittsError::from)) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Map a unit result to 0 / -1
fn status(result: Result<(), FittsError>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Session API
// ============================================================================

/// Opaque handle to a Session
pub struct FittsSessionHandle {
    session: Session,
}

unsafe fn session_mut<'a>(handle: *mut FittsSessionHandle) -> Option<&'a mut Session> {
    if handle.is_null() {
        set_last_error("Null session pointer");
        return None;
    }
    Some(&mut (*handle).session)
}

/// Create a new session.
///
/// # Safety
/// - `config_json` must be a valid null-terminated C string, or NULL for the
///   default configuration.
/// - Returns a pointer to a newly allocated session.
/// - Must be freed with `fitts_session_free`.
/// - Returns NULL on error; call `fitts_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn fitts_session_new(config_json: *const c_char) -> *mut FittsSessionHandle {
    clear_last_error();

    let config = if config_json.is_null() {
        Ok(ExperimentConfig::default())
    } else {
        match cstr_to_string(config_json) {
            Some(json) => ExperimentConfig::from_json(&json),
            None => Err(FittsError::ParseError(
                "config is not valid UTF-8".to_string(),
            )),
        }
    };

    match config.and_then(Session::new) {
        Ok(session) => Box::into_raw(Box::new(FittsSessionHandle { session })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a session.
///
/// # Safety
/// - `session` must be a valid pointer returned by `fitts_session_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn fitts_session_free(session: *mut FittsSessionHandle) {
    if !session.is_null() {
        drop(Box::from_raw(session));
    }
}

/// Forward a pointer move.
///
/// # Safety
/// - `session` must be a valid pointer returned by `fitts_session_new`.
/// - Returns 1 if the sample was added to the current path, 0 if not, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn fitts_session_pointer_move(
    session: *mut FittsSessionHandle,
    x: f64,
    y: f64,
) -> i32 {
    clear_last_error();

    match session_mut(session) {
        Some(s) => i32::from(s.on_pointer_move(x, y)),
        None => -1,
    }
}

/// Forward a pointer press and return the resulting events as a JSON array.
///
/// # Safety
/// - `session` must be a valid pointer returned by `fitts_session_new`.
/// - `modifiers_json` must be a valid null-terminated C string holding a JSON
///   array of key codes, or NULL for none.
/// - Returns a newly allocated string that must be freed with `fitts_free_string`.
/// - Returns NULL on error; call `fitts_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn fitts_session_pointer_down(
    session: *mut FittsSessionHandle,
    x: f64,
    y: f64,
    modifiers_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(s) = session_mut(session) else {
        return ptr::null_mut();
    };

    let modifiers: Vec<String> = if modifiers_json.is_null() {
        Vec::new()
    } else {
        let parsed = cstr_to_string(modifiers_json)
            .ok_or_else(|| FittsError::ParseError("modifiers are not valid UTF-8".to_string()))
            .and_then(|json| serde_json::from_str(&json).map_err(FittsError::from));
        match parsed {
            Ok(m) => m,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };
    let modifiers: Vec<&str> = modifiers.iter().map(String::as_str).collect();

    json_result(s.on_pointer_down(x, y, &modifiers))
}

/// Forward a key press and return the resulting events as a JSON array.
///
/// # Safety
/// - `session` must be a valid pointer returned by `fitts_session_new`.
/// - `code` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `fitts_free_string`.
/// - Returns NULL on error; call `fitts_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn fitts_session_key_down(
    session: *mut FittsSessionHandle,
    code: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(s) = session_mut(session) else {
        return ptr::null_mut();
    };
    let code = match cstr_to_string(code) {
        Some(c) => c,
        None => {
            set_last_error("Invalid key code pointer");
            return ptr::null_mut();
        }
    };

    json_result(s.on_key_down(&code))
}

/// Forward a key release.
///
/// # Safety
/// - `session` must be a valid pointer returned by `fitts_session_new`.
/// - `code` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn fitts_session_key_up(
    session: *mut FittsSessionHandle,
    code: *const c_char,
) -> i32 {
    clear_last_error();

    let Some(s) = session_mut(session) else {
        return -1;
    };
    match cstr_to_string(code) {
        Some(c) => {
            s.on_key_up(&c);
            0
        }
        None => {
            set_last_error("Invalid key code pointer");
            -1
        }
    }
}

/// Replace the ring layout and return the resulting events as a JSON array.
///
/// # Safety
/// - `session` must be a valid pointer returned by `fitts_session_new`.
/// - Returns a newly allocated string that must be freed with `fitts_free_string`.
/// - Returns NULL on error; call `fitts_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn fitts_session_regenerate_layout(
    session: *mut FittsSessionHandle,
    num: u32,
    distance: f64,
    width: f64,
) -> *mut c_char {
    clear_last_error();

    match session_mut(session) {
        Some(s) => json_result(s.regenerate_layout(num as usize, distance, width)),
        None => ptr::null_mut(),
    }
}

/// Move to the next battery entry and return the resulting events as a JSON array.
///
/// # Safety
/// - `session` must be a valid pointer returned by `fitts_session_new`.
/// - Returns a newly allocated string that must be freed with `fitts_free_string`.
/// - Returns NULL on error; call `fitts_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn fitts_session_advance_battery(
    session: *mut FittsSessionHandle,
) -> *mut c_char {
    clear_last_error();

    match session_mut(session) {
        Some(s) => json_result::<Vec<EngineEvent>>(s.advance_battery()),
        None => ptr::null_mut(),
    }
}

/// Create a data set and make it active.
///
/// # Safety
/// - `session` must be a valid pointer returned by `fitts_session_new`.
/// - Returns the new id, or -1 on error.
#[no_mangle]
pub unsafe extern "C" fn fitts_session_create_data_set(session: *mut FittsSessionHandle) -> i64 {
    clear_last_error();

    match session_mut(session) {
        Some(s) => i64::from(s.create_data_set()),
        None => -1,
    }
}

/// Delete a data set.
///
/// # Safety
/// - `session` must be a valid pointer returned by `fitts_session_new`.
/// - Returns 0 on success, -1 on error (e.g. deleting the only data set).
#[no_mangle]
pub unsafe extern "C" fn fitts_session_delete_data_set(
    session: *mut FittsSessionHandle,
    id: u32,
) -> i32 {
    clear_last_error();

    match session_mut(session) {
        Some(s) => status(s.delete_data_set(id)),
        None => -1,
    }
}

/// Select the data set new records are appended to.
///
/// # Safety
/// - `session` must be a valid pointer returned by `fitts_session_new`.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn fitts_session_set_active(
    session: *mut FittsSessionHandle,
    id: u32,
) -> i32 {
    clear_last_error();

    match session_mut(session) {
        Some(s) => status(s.set_active(id)),
        None => -1,
    }
}

/// Analyse a data set and return the result as JSON.
///
/// # Safety
/// - `session` must be a valid pointer returned by `fitts_session_new`.
/// - Returns a newly allocated string that must be freed with `fitts_free_string`.
/// - Returns NULL on error; call `fitts_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn fitts_session_analyze(
    session: *mut FittsSessionHandle,
    id: u32,
) -> *mut c_char {
    clear_last_error();

    match session_mut(session) {
        Some(s) => json_result(s.analyze(id)),
        None => ptr::null_mut(),
    }
}

/// Export data sets as a JSON document.
///
/// # Safety
/// - `session` must be a valid pointer returned by `fitts_session_new`.
/// - `ids_json` (JSON array of ids), `participant` and `device` must be valid
///   null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `fitts_free_string`.
/// - Returns NULL on error; call `fitts_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn fitts_session_export(
    session: *mut FittsSessionHandle,
    ids_json: *const c_char,
    participant: *const c_char,
    device: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(s) = session_mut(session) else {
        return ptr::null_mut();
    };

    let ids_str = match cstr_to_string(ids_json) {
        Some(j) => j,
        None => {
            set_last_error("Invalid ids string pointer");
            return ptr::null_mut();
        }
    };

    let participant = match cstr_to_string(participant) {
        Some(p) => p,
        None => {
            set_last_error("Invalid participant string pointer");
            return ptr::null_mut();
        }
    };

    let device = match cstr_to_string(device) {
        Some(d) => d,
        None => {
            set_last_error("Invalid device string pointer");
            return ptr::null_mut();
        }
    };

    let ids: Vec<u32> = match serde_json::from_str(&ids_str) {
        Ok(ids) => ids,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    json_result(s.serialize(&ids, &participant, &device))
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Fitts functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Fitts function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn fitts_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next Fitts function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn fitts_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the engine library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn fitts_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn config_json() -> CString {
        CString::new(
            r#"{
                "iso": { "num": 1, "distance": 50, "width": 10, "randomize": true },
                "battery": [ { "distance": 50, "width": 10, "actions": ["click"] } ]
            }"#,
        )
        .unwrap()
    }

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        fitts_free_string(ptr);
        s
    }

    unsafe fn last_error() -> String {
        let error = fitts_last_error();
        assert!(!error.is_null());
        CStr::from_ptr(error).to_str().unwrap().to_string()
    }

    #[test]
    fn test_ffi_session_lifecycle() {
        unsafe {
            let config = config_json();
            let session = fitts_session_new(config.as_ptr());
            assert!(!session.is_null());

            let (x, y) = {
                let target = (*session).session.engine().target().copied().unwrap();
                (target.x, target.y)
            };

            let events = take_string(fitts_session_pointer_down(session, x, y, ptr::null()));
            let events: serde_json::Value = serde_json::from_str(&events).unwrap();
            assert_eq!(events[0]["event"], "first_interaction");
            assert_eq!(events[1]["event"], "hit");

            let analysis = take_string(fitts_session_analyze(session, 1));
            let analysis: serde_json::Value = serde_json::from_str(&analysis).unwrap();
            assert_eq!(analysis["data_set_id"], 1);

            let ids = CString::new("[1]").unwrap();
            let participant = CString::new("P01").unwrap();
            let device = CString::new("mouse").unwrap();
            let export = take_string(fitts_session_export(
                session,
                ids.as_ptr(),
                participant.as_ptr(),
                device.as_ptr(),
            ));
            let export: serde_json::Value = serde_json::from_str(&export).unwrap();
            assert_eq!(export["id"], "P01");
            assert_eq!(export["data"][0]["data"].as_array().unwrap().len(), 1);

            fitts_session_free(session);
        }
    }

    #[test]
    fn test_ffi_data_sets() {
        unsafe {
            let session = fitts_session_new(ptr::null());
            assert!(!session.is_null());

            assert_eq!(fitts_session_delete_data_set(session, 1), -1);
            assert!(last_error().contains("only data set"));

            assert_eq!(fitts_session_create_data_set(session), 2);
            assert_eq!(fitts_session_set_active(session, 1), 0);
            assert_eq!(fitts_session_set_active(session, 7), -1);
            assert_eq!(fitts_session_delete_data_set(session, 1), 0);

            assert!(fitts_session_analyze(session, 1).is_null());
            assert!(last_error().contains("not found"));

            fitts_session_free(session);
        }
    }

    #[test]
    fn test_ffi_keys_and_layout() {
        unsafe {
            let session = fitts_session_new(ptr::null());
            let code = CString::new("ShiftLeft").unwrap();

            let events = take_string(fitts_session_key_down(session, code.as_ptr()));
            assert_eq!(events, "[]");
            assert_eq!(fitts_session_key_up(session, code.as_ptr()), 0);

            let events = take_string(fitts_session_regenerate_layout(session, 5, 100.0, 12.0));
            assert!(events.contains("layout_regenerated"));
            assert_eq!(fitts_session_pointer_move(session, 3.0, 4.0), 1);

            assert!(fitts_session_regenerate_layout(session, 0, 100.0, 12.0).is_null());
            fitts_session_free(session);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid = CString::new("not json").unwrap();
            assert!(fitts_session_new(invalid.as_ptr()).is_null());
            assert!(!last_error().is_empty());

            assert_eq!(fitts_session_pointer_move(ptr::null_mut(), 0.0, 0.0), -1);
            assert_eq!(last_error(), "Null session pointer");
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = fitts_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, crate::ENGINE_VERSION);
        }
    }
}
