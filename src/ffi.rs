//! C ABI.
//!
//! Conventions:
//! - strings cross as NUL-terminated UTF-8;
//! - every string the library returns is owned by the library and must be
//!   released with [`hb_string_free`], or through [`hb_result_free`] /
//!   [`hb_sql_result_free`] when it arrives inside a result struct;
//! - null pointers and invalid UTF-8 are reported as input errors.
//!
//! ```c
//! hb_bridge* b = hb_bridge_new("{\"logFilter\":\"debug\"}");
//! HbResult r = hb_ftp_get_text(b, "ftp://user:pw@host/notes.txt");
//! if (r.code == 0) puts(r.data); else fprintf(stderr, "%s\n", r.error);
//! hb_result_free(r);
//!
//! r = hb_http_get(b, "https://example.com/api", "Accept: application/json", NULL);
//! hb_result_free(r);
//! hb_bridge_free(b);
//! ```

use crate::bridge::Bridge;
use crate::error::{BridgeError, BridgeResult};
use crate::files;
use crate::json::{self, JsonResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hostbridge_ftp::TransferError;
use hostbridge_http::{basic_auth_line, bearer_auth_line, header_line, HttpError, HttpMethod, HttpResponse};
use hostbridge_sql::{PoolSettings, SqlError, SqlOutcome, SqlParam};
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;

/// Opaque bridge handle.
#[repr(C)]
#[allow(non_camel_case_types)]
pub struct hb_bridge {
    _private: [u8; 0],
}

impl hb_bridge {
    fn from_internal(bridge: Box<Bridge>) -> *mut Self {
        Box::into_raw(bridge) as *mut Self
    }

    /// # Safety
    /// Pointer must have come from `from_internal` and not been freed.
    unsafe fn as_internal<'a>(ptr: *const Self) -> BridgeResult<&'a Bridge> {
        (ptr as *const Bridge).as_ref().ok_or(BridgeError::NullArgument("bridge"))
    }

    /// # Safety
    /// Pointer must have come from `from_internal`.
    unsafe fn into_internal(ptr: *mut Self) -> Box<Bridge> {
        Box::from_raw(ptr as *mut Bridge)
    }
}

/// Outcome of a transfer, HTTP, JSON or file call. `code == 0` means success; `data`
/// is null for calls that return nothing, `error` is null on success.
#[repr(C)]
pub struct HbResult {
    pub data: *mut c_char,
    pub error: *mut c_char,
    pub code: i32,
}

/// Outcome of a SQL call: the JSON document plus two 0/1 flags.
#[repr(C)]
pub struct HbSqlResult {
    pub json: *mut c_char,
    pub is_error: i32,
    pub is_empty: i32,
}

const PANIC_CODE: i32 = -199;

fn c_string_lossy(s: &str) -> *mut c_char {
    CString::new(s.replace('\0', " ")).unwrap_or_default().into_raw()
}

impl HbResult {
    fn ok(data: Option<String>) -> Self {
        let data = match data {
            None => ptr::null_mut(),
            Some(d) => match CString::new(d) {
                Ok(c) => c.into_raw(),
                Err(_) => return Self::from_bridge(&BridgeError::InteriorNul("result")),
            },
        };
        Self { data, error: ptr::null_mut(), code: 0 }
    }

    fn fail(code: i32, message: &str) -> Self {
        Self { data: ptr::null_mut(), error: c_string_lossy(message), code }
    }

    fn from_bridge(e: &BridgeError) -> Self {
        Self::fail(e.code(), &e.to_string())
    }

    fn from_transfer(e: &TransferError) -> Self {
        Self::fail(e.code(), &e.to_string())
    }

    fn from_file(e: &files::FileError) -> Self {
        Self::fail(e.code(), &e.to_string())
    }

    fn from_http(e: &HttpError) -> Self {
        Self::fail(e.code(), &e.to_string())
    }

    fn from_json(e: &json::JsonError) -> Self {
        Self::fail(e.code(), &e.to_string())
    }
}

impl From<SqlOutcome> for HbSqlResult {
    fn from(o: SqlOutcome) -> Self {
        Self {
            json: c_string_lossy(&o.json),
            is_error: o.is_error as i32,
            is_empty: o.is_empty as i32,
        }
    }
}

impl HbSqlResult {
    fn input_error(message: String) -> Self {
        SqlOutcome::error(&SqlError::InvalidParameter { value: String::new(), reason: message }).into()
    }
}

/// Run `f`, turning a panic into an error result instead of unwinding
/// into the host.
fn guarded<T>(on_panic: impl FnOnce() -> T, f: impl FnOnce() -> T) -> T {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        log::error!("panic caught at the C boundary");
        on_panic()
    })
}

fn panic_result() -> HbResult {
    HbResult::fail(PANIC_CODE, "internal error")
}

fn panic_sql_result() -> HbSqlResult {
    SqlOutcome::error(&SqlError::Query("internal error".to_string())).into()
}

/// # Safety
/// `ptr` must be null or a valid NUL-terminated string.
unsafe fn arg<'a>(ptr: *const c_char, name: &'static str) -> BridgeResult<&'a str> {
    if ptr.is_null() {
        return Err(BridgeError::NullArgument(name));
    }
    CStr::from_ptr(ptr).to_str().map_err(|_| BridgeError::InvalidUtf8(name))
}

/// # Safety
/// `args` must point to `argc` valid string pointers (or be null with `argc == 0`).
unsafe fn sql_args(args: *const *const c_char, argc: usize) -> Result<Vec<SqlParam>, String> {
    if argc == 0 {
        return Ok(Vec::new());
    }
    if args.is_null() {
        return Err("args is null but argc > 0".to_string());
    }
    std::slice::from_raw_parts(args, argc)
        .iter()
        .map(|&p| {
            let s = arg(p, "args").map_err(|e| e.to_string())?;
            SqlParam::from_tagged(s).map_err(|e| e.to_string())
        })
        .collect()
}

fn transfer_result<T>(r: Result<T, TransferError>, render: impl FnOnce(T) -> Option<String>) -> HbResult {
    match r {
        Ok(v) => HbResult::ok(render(v)),
        Err(e) => HbResult::from_transfer(&e),
    }
}

fn file_result<T>(r: files::FileResult<T>, render: impl FnOnce(T) -> Option<String>) -> HbResult {
    match r {
        Ok(v) => HbResult::ok(render(v)),
        Err(e) => HbResult::from_file(&e),
    }
}

fn json_result<T>(r: JsonResult<T>, render: impl FnOnce(T) -> Option<String>) -> HbResult {
    match r {
        Ok(v) => HbResult::ok(render(v)),
        Err(e) => HbResult::from_json(&e),
    }
}

fn names_json(names: Vec<String>) -> Option<String> {
    // A Vec<String> always serialises.
    Some(serde_json::to_string(&names).unwrap_or_else(|_| "[]".to_string()))
}

/// Decode every named string argument, then run `op` on them.
unsafe fn string_call(
    inputs: &[(*const c_char, &'static str)],
    op: impl FnOnce(&[&str]) -> HbResult,
) -> HbResult {
    guarded(panic_result, || {
        let mut decoded = Vec::with_capacity(inputs.len());
        for &(p, name) in inputs {
            match arg(p, name) {
                Ok(s) => decoded.push(s),
                Err(e) => return HbResult::from_bridge(&e),
            }
        }
        op(&decoded)
    })
}

// ── Lifecycle ───────────────────────────────────────────────────────

/// Create a bridge. `config_json` may be null for defaults. Returns null
/// when the configuration does not parse or the runtime cannot start.
///
/// # Safety
/// `config_json` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn hb_bridge_new(config_json: *const c_char) -> *mut hb_bridge {
    guarded(ptr::null_mut, || {
        let json = if config_json.is_null() {
            ""
        } else {
            match arg(config_json, "config_json") {
                Ok(s) => s,
                Err(_) => return ptr::null_mut(),
            }
        };
        match Bridge::from_json(json) {
            Ok(bridge) => hb_bridge::from_internal(Box::new(bridge)),
            Err(e) => {
                log::error!("bridge creation failed: {e}");
                ptr::null_mut()
            }
        }
    })
}

/// Destroy a bridge, closing any open SQL connectors. Null is a no-op.
///
/// # Safety
/// `bridge` must be null or a pointer from [`hb_bridge_new`] not yet freed.
#[no_mangle]
pub unsafe extern "C" fn hb_bridge_free(bridge: *mut hb_bridge) {
    if !bridge.is_null() {
        drop(hb_bridge::into_internal(bridge));
    }
}

/// # Safety
/// `s` must be null or a string returned by this library, freed once.
#[no_mangle]
pub unsafe extern "C" fn hb_string_free(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// # Safety
/// `result` must come from this library and be freed once.
#[no_mangle]
pub unsafe extern "C" fn hb_result_free(result: HbResult) {
    hb_string_free(result.data);
    hb_string_free(result.error);
}

/// # Safety
/// `result` must come from this library and be freed once.
#[no_mangle]
pub unsafe extern "C" fn hb_sql_result_free(result: HbSqlResult) {
    hb_string_free(result.json);
}

/// Library version; static, do not free.
#[no_mangle]
pub extern "C" fn hb_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

// ── FTP / SFTP ──────────────────────────────────────────────────────

/// Run a transfer call against the bridge with one decoded URL.
unsafe fn with_url(
    bridge: *const hb_bridge,
    url: *const c_char,
    op: impl FnOnce(&Bridge, &str) -> HbResult,
) -> HbResult {
    guarded(panic_result, || {
        let bridge = match hb_bridge::as_internal(bridge) {
            Ok(b) => b,
            Err(e) => return HbResult::from_bridge(&e),
        };
        match arg(url, "url") {
            Ok(url) => op(bridge, url),
            Err(e) => HbResult::from_bridge(&e),
        }
    })
}

/// Download as base64 in `data`.
///
/// # Safety
/// Pointer arguments must be valid (see module docs).
#[no_mangle]
pub unsafe extern "C" fn hb_ftp_get_file(bridge: *const hb_bridge, url: *const c_char) -> HbResult {
    with_url(bridge, url, |b, url| transfer_result(b.get_file(url), |d| Some(STANDARD.encode(d))))
}

/// # Safety
/// Pointer arguments must be valid (see module docs).
#[no_mangle]
pub unsafe extern "C" fn hb_ftp_get_text(bridge: *const hb_bridge, url: *const c_char) -> HbResult {
    with_url(bridge, url, |b, url| transfer_result(b.get_text(url), Some))
}

/// Names in the directory as a JSON array of strings.
///
/// # Safety
/// Pointer arguments must be valid (see module docs).
#[no_mangle]
pub unsafe extern "C" fn hb_ftp_list_files(bridge: *const hb_bridge, url: *const c_char) -> HbResult {
    with_url(bridge, url, |b, url| transfer_result(b.list_files(url), names_json))
}

/// Upload base64 content.
///
/// # Safety
/// Pointer arguments must be valid (see module docs).
#[no_mangle]
pub unsafe extern "C" fn hb_ftp_put_file(
    bridge: *const hb_bridge,
    b64: *const c_char,
    url: *const c_char,
) -> HbResult {
    let content = match arg(b64, "data") {
        Ok(s) => s,
        Err(e) => return HbResult::from_bridge(&e),
    };
    with_url(bridge, url, |b, url| match STANDARD.decode(content.trim()) {
        Ok(data) => transfer_result(b.put_file(&data, url), |_| None),
        Err(e) => HbResult::from_bridge(&BridgeError::InvalidBase64(e.to_string())),
    })
}

/// # Safety
/// Pointer arguments must be valid (see module docs).
#[no_mangle]
pub unsafe extern "C" fn hb_ftp_put_text(
    bridge: *const hb_bridge,
    text: *const c_char,
    url: *const c_char,
) -> HbResult {
    let text = match arg(text, "text") {
        Ok(s) => s,
        Err(e) => return HbResult::from_bridge(&e),
    };
    with_url(bridge, url, |b, url| transfer_result(b.put_text(text, url), |_| None))
}

/// # Safety
/// Pointer arguments must be valid (see module docs).
#[no_mangle]
pub unsafe extern "C" fn hb_ftp_create_dir(bridge: *const hb_bridge, url: *const c_char) -> HbResult {
    with_url(bridge, url, |b, url| transfer_result(b.create_dir(url), |_| None))
}

// ── HTTP ────────────────────────────────────────────────────────────

/// Like [`arg`], but null reads as the empty string.
///
/// # Safety
/// `ptr` must be null or a valid NUL-terminated string.
unsafe fn opt_arg<'a>(ptr: *const c_char, name: &'static str) -> BridgeResult<&'a str> {
    if ptr.is_null() {
        Ok("")
    } else {
        arg(ptr, name)
    }
}

/// `headers` and `body` may be null.
unsafe fn http_call(
    bridge: *const hb_bridge,
    method: HttpMethod,
    url: *const c_char,
    headers: *const c_char,
    body: *const c_char,
    render: impl FnOnce(HttpResponse) -> Option<String>,
) -> HbResult {
    let extra = (|| Ok::<_, BridgeError>((opt_arg(headers, "headers")?, opt_arg(body, "body")?)))();
    let (headers, body) = match extra {
        Ok(v) => v,
        Err(e) => return HbResult::from_bridge(&e),
    };
    with_url(bridge, url, |b, url| match b.http_request(method, url, headers, body) {
        Ok(resp) => HbResult::ok(render(resp)),
        Err(e) => HbResult::from_http(&e),
    })
}

fn body_only(resp: HttpResponse) -> Option<String> {
    Some(resp.body)
}

/// Send any supported method. `data` is the whole response as JSON:
/// `{"status": 200, "headers": [["name", "value"], ...], "body": "..."}`.
/// Any status the server sends is a success here.
///
/// # Safety
/// Pointer arguments must be valid; `headers` and `body` may be null.
#[no_mangle]
pub unsafe extern "C" fn hb_http_request(
    bridge: *const hb_bridge,
    method: *const c_char,
    url: *const c_char,
    headers: *const c_char,
    body: *const c_char,
) -> HbResult {
    let method = match arg(method, "method") {
        Ok(m) => m,
        Err(e) => return HbResult::from_bridge(&e),
    };
    match method.parse::<HttpMethod>() {
        Ok(m) => http_call(bridge, m, url, headers, body, |resp| {
            Some(serde_json::to_string(&resp).unwrap_or_else(|_| "{}".to_string()))
        }),
        Err(e) => HbResult::from_http(&e),
    }
}

macro_rules! http_verb {
    ($(#[$doc:meta])* $name:ident, $method:expr) => {
        $(#[$doc])*
        /// `data` is the response body, whatever the status.
        ///
        /// # Safety
        /// Pointer arguments must be valid; `headers` and `body` may be null.
        #[no_mangle]
        pub unsafe extern "C" fn $name(
            bridge: *const hb_bridge,
            url: *const c_char,
            headers: *const c_char,
            body: *const c_char,
        ) -> HbResult {
            http_call(bridge, $method, url, headers, body, body_only)
        }
    };
}

http_verb!(hb_http_get, HttpMethod::Get);
http_verb!(hb_http_post, HttpMethod::Post);
http_verb!(hb_http_put, HttpMethod::Put);
http_verb!(hb_http_patch, HttpMethod::Patch);
http_verb!(hb_http_delete, HttpMethod::Delete);
http_verb!(
    /// The body is always empty.
    hb_http_head,
    HttpMethod::Head
);
http_verb!(hb_http_options, HttpMethod::Options);

/// `"key: value"`, ready to join into a header block with `\n`. Returns
/// null on bad input. Free with [`hb_string_free`].
///
/// # Safety
/// Arguments must be null or valid strings.
#[no_mangle]
pub unsafe extern "C" fn hb_http_header(key: *const c_char, value: *const c_char) -> *mut c_char {
    match (arg(key, "key"), arg(value, "value")) {
        (Ok(k), Ok(v)) => c_string_lossy(&header_line(k, v)),
        _ => ptr::null_mut(),
    }
}

/// `Authorization: Bearer <token>`.
///
/// # Safety
/// `token` must be null or a valid string.
#[no_mangle]
pub unsafe extern "C" fn hb_http_header_bearer(token: *const c_char) -> *mut c_char {
    match arg(token, "token") {
        Ok(t) => c_string_lossy(&bearer_auth_line(t)),
        Err(_) => ptr::null_mut(),
    }
}

/// `Authorization: Basic <base64(user:pass)>`.
///
/// # Safety
/// Arguments must be null or valid strings.
#[no_mangle]
pub unsafe extern "C" fn hb_http_header_basic(user: *const c_char, pass: *const c_char) -> *mut c_char {
    match (arg(user, "user"), arg(pass, "pass")) {
        (Ok(u), Ok(p)) => c_string_lossy(&basic_auth_line(u, p)),
        _ => ptr::null_mut(),
    }
}

// ── SQL ─────────────────────────────────────────────────────────────

/// Open a private connection, run `query` with tagged `args`, close.
///
/// # Safety
/// Pointer arguments must be valid; `args` holds `argc` strings.
#[no_mangle]
pub unsafe extern "C" fn hb_sql_run(
    bridge: *const hb_bridge,
    driver: *const c_char,
    dsn: *const c_char,
    query: *const c_char,
    args: *const *const c_char,
    argc: usize,
) -> HbSqlResult {
    guarded(panic_sql_result, || {
        let inputs = (|| {
            Ok::<_, BridgeError>((
                hb_bridge::as_internal(bridge)?,
                arg(driver, "driver")?,
                arg(dsn, "dsn")?,
                arg(query, "query")?,
            ))
        })();
        let (b, driver, dsn, query) = match inputs {
            Ok(v) => v,
            Err(e) => return HbSqlResult::input_error(e.to_string()),
        };
        match sql_args(args, argc) {
            Ok(params) => b.sql_run(driver, dsn, query, &params).into(),
            Err(msg) => HbSqlResult::input_error(msg),
        }
    })
}

/// Open (or reuse) a pooled connector. On success the JSON is
/// `{"handle": N}` and `N` is also written to `out_handle` when non-null.
/// `pool_json` may be null for the bridge's default pool settings.
///
/// # Safety
/// Pointer arguments must be valid; `out_handle` may be null.
#[no_mangle]
pub unsafe extern "C" fn hb_sql_load(
    bridge: *const hb_bridge,
    driver: *const c_char,
    dsn: *const c_char,
    pool_json: *const c_char,
    out_handle: *mut u64,
) -> HbSqlResult {
    guarded(panic_sql_result, || {
        let inputs = (|| {
            Ok::<_, BridgeError>((hb_bridge::as_internal(bridge)?, arg(driver, "driver")?, arg(dsn, "dsn")?))
        })();
        let (b, driver, dsn) = match inputs {
            Ok(v) => v,
            Err(e) => return HbSqlResult::input_error(e.to_string()),
        };
        let settings = if pool_json.is_null() {
            None
        } else {
            let parsed = arg(pool_json, "pool_json")
                .map_err(|e| e.to_string())
                .and_then(|s| serde_json::from_str::<PoolSettings>(s).map_err(|e| e.to_string()));
            match parsed {
                Ok(s) => Some(s),
                Err(msg) => return HbSqlResult::input_error(msg),
            }
        };
        match b.sql_load(driver, dsn, settings) {
            Ok(handle) => {
                if let Some(out) = out_handle.as_mut() {
                    *out = handle;
                }
                SqlOutcome::data(serde_json::json!({ "handle": handle }).to_string()).into()
            }
            Err(e) => SqlOutcome::failed(e).into(),
        }
    })
}

/// # Safety
/// Pointer arguments must be valid; `args` holds `argc` strings.
#[no_mangle]
pub unsafe extern "C" fn hb_sql_run_on(
    bridge: *const hb_bridge,
    handle: u64,
    query: *const c_char,
    args: *const *const c_char,
    argc: usize,
) -> HbSqlResult {
    guarded(panic_sql_result, || {
        let inputs = (|| Ok::<_, BridgeError>((hb_bridge::as_internal(bridge)?, arg(query, "query")?)))();
        let (b, query) = match inputs {
            Ok(v) => v,
            Err(e) => return HbSqlResult::input_error(e.to_string()),
        };
        match sql_args(args, argc) {
            Ok(params) => b.sql_run_on(handle, query, &params).into(),
            Err(msg) => HbSqlResult::input_error(msg),
        }
    })
}

/// # Safety
/// `bridge` must be valid.
#[no_mangle]
pub unsafe extern "C" fn hb_sql_close(bridge: *const hb_bridge, handle: u64) -> HbSqlResult {
    guarded(panic_sql_result, || match hb_bridge::as_internal(bridge) {
        Ok(b) => match b.sql_close(handle) {
            Ok(()) => SqlOutcome::status_ok().into(),
            Err(e) => SqlOutcome::failed(e).into(),
        },
        Err(e) => HbSqlResult::input_error(e.to_string()),
    })
}

// ── Files ───────────────────────────────────────────────────────────

/// # Safety
/// Pointer arguments must be valid.
#[no_mangle]
pub unsafe extern "C" fn hb_file_write_binary(b64: *const c_char, path: *const c_char) -> HbResult {
    string_call(&[(b64, "data"), (path, "path")], |a| file_result(files::write_binary(a[0], a[1]), |_| None))
}

/// # Safety
/// Pointer arguments must be valid.
#[no_mangle]
pub unsafe extern "C" fn hb_file_write_text(text: *const c_char, path: *const c_char) -> HbResult {
    string_call(&[(text, "text"), (path, "path")], |a| file_result(files::write_text(a[0], a[1]), |_| None))
}

/// Content as base64 in `data`.
///
/// # Safety
/// Pointer arguments must be valid.
#[no_mangle]
pub unsafe extern "C" fn hb_file_read_binary(path: *const c_char) -> HbResult {
    string_call(&[(path, "path")], |a| file_result(files::read_binary(a[0]), Some))
}

/// # Safety
/// Pointer arguments must be valid.
#[no_mangle]
pub unsafe extern "C" fn hb_file_read_text(path: *const c_char) -> HbResult {
    string_call(&[(path, "path")], |a| file_result(files::read_text(a[0]), Some))
}

/// # Safety
/// Pointer arguments must be valid.
#[no_mangle]
pub unsafe extern "C" fn hb_file_create_dir(path: *const c_char) -> HbResult {
    string_call(&[(path, "path")], |a| file_result(files::create_dir(a[0]), |_| None))
}

/// 1 when the path exists, 0 otherwise (including bad input).
///
/// # Safety
/// `path` must be null or a valid string.
#[no_mangle]
pub unsafe extern "C" fn hb_file_path_exists(path: *const c_char) -> i32 {
    match arg(path, "path") {
        Ok(p) => files::path_exists(p) as i32,
        Err(_) => 0,
    }
}

/// Regular file names as a JSON array.
///
/// # Safety
/// Pointer arguments must be valid.
#[no_mangle]
pub unsafe extern "C" fn hb_file_list_files(dir: *const c_char) -> HbResult {
    string_call(&[(dir, "dir")], |a| file_result(files::list_files(a[0]), names_json))
}

/// MIME type guessed from base64 content. Free with [`hb_string_free`].
///
/// # Safety
/// `b64` must be null or a valid string.
#[no_mangle]
pub unsafe extern "C" fn hb_file_content_type(b64: *const c_char) -> *mut c_char {
    let mime = arg(b64, "data").map(files::content_type).unwrap_or("application/octet-stream");
    c_string_lossy(mime)
}

// ── JSON ────────────────────────────────────────────────────────────
//
// Documents go in and come out as text. Calls that produce a document
// put it in `data`; calls that produce a list put a JSON array there.

/// Compact re-encoding of `json`.
///
/// # Safety
/// Pointer arguments must be valid.
#[no_mangle]
pub unsafe extern "C" fn hb_json_normalize(json: *const c_char) -> HbResult {
    string_call(&[(json, "json")], |a| json_result(json::normalize(a[0]), Some))
}

/// 1 when `json` is one well-formed document, 0 otherwise.
///
/// # Safety
/// `json` must be null or a valid string.
#[no_mangle]
pub unsafe extern "C" fn hb_json_is_valid(json: *const c_char) -> i32 {
    arg(json, "json").map(json::is_valid).unwrap_or(false) as i32
}

/// Top-level member as text: strings unquoted, other values as JSON.
///
/// # Safety
/// Pointer arguments must be valid.
#[no_mangle]
pub unsafe extern "C" fn hb_json_get_value(json: *const c_char, key: *const c_char) -> HbResult {
    string_call(&[(json, "json"), (key, "key")], |a| json_result(json::get_value(a[0], a[1]), Some))
}

/// Like [`hb_json_get_value`] along a dot path such as `items.0.name`.
///
/// # Safety
/// Pointer arguments must be valid.
#[no_mangle]
pub unsafe extern "C" fn hb_json_get_value_by_path(json: *const c_char, path: *const c_char) -> HbResult {
    string_call(&[(json, "json"), (path, "path")], |a| json_result(json::get_value_by_path(a[0], a[1]), Some))
}

/// # Safety
/// Pointer arguments must be valid.
#[no_mangle]
pub unsafe extern "C" fn hb_json_keys(json: *const c_char) -> HbResult {
    string_call(&[(json, "json")], |a| json_result(json::keys(a[0]), names_json))
}

/// Element count as decimal text.
///
/// # Safety
/// Pointer arguments must be valid.
#[no_mangle]
pub unsafe extern "C" fn hb_json_array_length(json: *const c_char) -> HbResult {
    string_call(&[(json, "json")], |a| json_result(json::array_length(a[0]), |n| Some(n.to_string())))
}

/// # Safety
/// Pointer arguments must be valid.
#[no_mangle]
pub unsafe extern "C" fn hb_json_array_item(json: *const c_char, index: i64) -> HbResult {
    string_call(&[(json, "json")], |a| json_result(json::array_item(a[0], index), Some))
}

/// A JSON array of strings, each the JSON text of one element.
///
/// # Safety
/// Pointer arguments must be valid.
#[no_mangle]
pub unsafe extern "C" fn hb_json_array_items(json: *const c_char) -> HbResult {
    string_call(&[(json, "json")], |a| json_result(json::array_items(a[0]), names_json))
}

/// # Safety
/// Pointer arguments must be valid.
#[no_mangle]
pub unsafe extern "C" fn hb_json_add_string(json: *const c_char, key: *const c_char, value: *const c_char) -> HbResult {
    string_call(&[(json, "json"), (key, "key"), (value, "value")], |a| {
        json_result(json::add_string(a[0], a[1], a[2]), Some)
    })
}

/// # Safety
/// Pointer arguments must be valid.
#[no_mangle]
pub unsafe extern "C" fn hb_json_add_number(json: *const c_char, key: *const c_char, value: f64) -> HbResult {
    string_call(&[(json, "json"), (key, "key")], |a| json_result(json::add_number(a[0], a[1], value), Some))
}

/// Any non-zero `value` is `true`.
///
/// # Safety
/// Pointer arguments must be valid.
#[no_mangle]
pub unsafe extern "C" fn hb_json_add_bool(json: *const c_char, key: *const c_char, value: i32) -> HbResult {
    string_call(&[(json, "json"), (key, "key")], |a| json_result(json::add_bool(a[0], a[1], value != 0), Some))
}

/// Nest the document `child` under `key` of `parent`.
///
/// # Safety
/// Pointer arguments must be valid.
#[no_mangle]
pub unsafe extern "C" fn hb_json_add_json(parent: *const c_char, key: *const c_char, child: *const c_char) -> HbResult {
    string_call(&[(parent, "parent"), (key, "key"), (child, "child")], |a| {
        json_result(json::add_json(a[0], a[1], a[2]), Some)
    })
}

/// # Safety
/// Pointer arguments must be valid.
#[no_mangle]
pub unsafe extern "C" fn hb_json_add_item(array: *const c_char, item: *const c_char) -> HbResult {
    string_call(&[(array, "array"), (item, "item")], |a| json_result(json::add_item(a[0], a[1]), Some))
}

/// # Safety
/// Pointer arguments must be valid.
#[no_mangle]
pub unsafe extern "C" fn hb_json_remove_key(json: *const c_char, key: *const c_char) -> HbResult {
    string_call(&[(json, "json"), (key, "key")], |a| json_result(json::remove_key(a[0], a[1]), Some))
}

/// # Safety
/// Pointer arguments must be valid.
#[no_mangle]
pub unsafe extern "C" fn hb_json_remove_item(array: *const c_char, index: i64) -> HbResult {
    string_call(&[(array, "array")], |a| json_result(json::remove_item(a[0], index), Some))
}

/// Shallow merge; members of `overlay` replace those of `base`.
///
/// # Safety
/// Pointer arguments must be valid.
#[no_mangle]
pub unsafe extern "C" fn hb_json_merge(base: *const c_char, overlay: *const c_char) -> HbResult {
    string_call(&[(base, "base"), (overlay, "overlay")], |a| json_result(json::merge(a[0], a[1]), Some))
}

/// Structural check of `json` against an example-shaped `schema`.
/// `code == 0` means it conforms; `data` is always null.
///
/// # Safety
/// Pointer arguments must be valid.
#[no_mangle]
pub unsafe extern "C" fn hb_json_validate(json: *const c_char, schema: *const c_char) -> HbResult {
    string_call(&[(json, "json"), (schema, "schema")], |a| json_result(json::validate(a[0], a[1]), |_| None))
}
