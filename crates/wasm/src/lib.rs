use std::cell::RefCell;

use gopview_core::Session;
use gopview_core::model::SurfaceKind;
use gopview_protocol::Viewport;
use serde::Serialize;
use wasm_bindgen::prelude::*;

thread_local! {
    // Sessions hold non-Send selection subscribers, so they live per thread
    // rather than behind a global lock.
    static SESSIONS: RefCell<Vec<Session>> = const { RefCell::new(Vec::new()) };
}

fn with_session<T>(
    handle: usize,
    f: impl FnOnce(&mut Session) -> Result<T, JsError>,
) -> Result<T, JsError> {
    SESSIONS.with(|sessions| {
        let mut sessions = sessions.borrow_mut();
        let session = sessions
            .get_mut(handle)
            .ok_or_else(|| JsError::new("invalid session handle"))?;
        f(session)
    })
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&e.to_string()))
}

/// Parse a frame list from bytes (JSON). Returns a handle for later calls.
#[wasm_bindgen]
pub fn load_frames(data: &[u8]) -> Result<usize, JsError> {
    let frames = gopview_core::load_frames(data).map_err(|e| JsError::new(&e.to_string()))?;
    let session = Session::from_frames(frames);
    Ok(SESSIONS.with(|sessions| {
        let mut sessions = sessions.borrow_mut();
        sessions.push(session);
        sessions.len() - 1
    }))
}

/// Temporal level analysis as JSON.
#[wasm_bindgen]
pub fn analyze(handle: usize) -> Result<String, JsError> {
    with_session(handle, |session| to_json(session.analysis()))
}

#[derive(Serialize)]
struct ArrowLayoutJson<'a> {
    #[serde(flatten)]
    layout: &'a gopview_core::ArrowLayoutResult,
    visible: Vec<bool>,
}

/// Reference arrow layout for a strip `width` wide, with visibility flags for
/// the `focus` frame index. Repeated calls that only change `focus` reuse the
/// cached geometry.
#[wasm_bindgen]
pub fn layout_arrows(handle: usize, width: f64, focus: Option<u32>) -> Result<String, JsError> {
    with_session(handle, |session| {
        let viewport = Viewport::sized(width, 0.0);
        let arrows = session.arrows_focused(&viewport, focus);
        to_json(&ArrowLayoutJson {
            layout: arrows.result,
            visible: arrows.visibility(),
        })
    })
}

/// Render a surface, returning render commands as JSON. `current` is a list
/// position; when given it becomes the selection first.
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn render_view(
    handle: usize,
    surface: &str,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    dpr: f64,
    current: Option<usize>,
) -> Result<String, JsError> {
    let surface = SurfaceKind::from_name(surface)
        .ok_or_else(|| JsError::new(&format!("unknown surface: {surface}")))?;
    let viewport = Viewport {
        x,
        y,
        width,
        height,
        dpr,
    };

    with_session(handle, |session| {
        if let Some(position) = current {
            session.select(position);
        }
        to_json(&session.render(surface, &viewport))
    })
}

/// Get the number of frames behind a handle.
#[wasm_bindgen]
pub fn frame_count(handle: usize) -> Result<usize, JsError> {
    with_session(handle, |session| Ok(session.len()))
}
