// Shake-break via device motion.
//
// iOS gates `devicemotion` behind DeviceMotionEvent.requestPermission,
// which only resolves when called first inside a user-gesture handler;
// the caller invokes `MotionShake::enable` synchronously from the first
// touch. Denial, absence of the API, or a teardown racing the prompt
// all silently leave the feature off — pointer-based shake keeps
// working either way.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::DeviceMotionEvent;

use crate::controller::CookieController;
use crate::util::clog;

pub struct MotionShake {
    listener: Option<Closure<dyn FnMut(DeviceMotionEvent)>>,
}

impl MotionShake {
    /// Requests permission (where gated) and attaches the devicemotion
    /// listener. The cancellation flag is checked at the async
    /// resumption point so teardown mid-prompt never leaks a listener.
    pub fn enable(
        controller: Rc<RefCell<CookieController>>,
        cancelled: Rc<Cell<bool>>,
    ) -> Rc<RefCell<MotionShake>> {
        let slot = Rc::new(RefCell::new(MotionShake { listener: None }));
        let slot_async = slot.clone();
        wasm_bindgen_futures::spawn_local(async move {
            if !request_permission().await {
                clog("devicemotion unavailable or denied; shake via pointer only");
                return;
            }
            if cancelled.get() {
                return;
            }
            attach_listener(&slot_async, controller);
        });
        slot
    }

    pub fn detach(&mut self) {
        if let Some(cb) = self.listener.take() {
            if let Some(window) = web_sys::window() {
                let _ = window.remove_event_listener_with_callback(
                    "devicemotion",
                    cb.as_ref().unchecked_ref(),
                );
            }
        }
    }
}

impl Drop for MotionShake {
    fn drop(&mut self) {
        self.detach();
    }
}

/// True when motion events may be listened for. Platforms without the
/// permission gate grant implicitly.
async fn request_permission() -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    let ctor = match Reflect::get(&window, &JsValue::from_str("DeviceMotionEvent")) {
        Ok(v) if !v.is_undefined() => v,
        _ => return false,
    };
    let req = match Reflect::get(&ctor, &JsValue::from_str("requestPermission")) {
        Ok(v) => v,
        Err(_) => return true,
    };
    if !req.is_function() {
        // No gate on this platform.
        return true;
    }
    let func: Function = req.unchecked_into();
    let Ok(promise) = func.call0(&ctor) else {
        return false;
    };
    match wasm_bindgen_futures::JsFuture::from(promise.unchecked_into::<Promise>()).await {
        Ok(v) => v.as_string().as_deref() == Some("granted"),
        Err(_) => false,
    }
}

fn attach_listener(slot: &Rc<RefCell<MotionShake>>, controller: Rc<RefCell<CookieController>>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let perf = window.performance();
    let cb = Closure::wrap(Box::new(move |e: DeviceMotionEvent| {
        let now = perf.as_ref().map(|p| p.now()).unwrap_or(0.0);
        if let Some(acc) = e.acceleration() {
            let ax = acc.x().unwrap_or(0.0);
            let ay = acc.y().unwrap_or(0.0);
            controller.borrow_mut().motion_sample(ax, ay, now);
        }
    }) as Box<dyn FnMut(_)>);
    if window
        .add_event_listener_with_callback("devicemotion", cb.as_ref().unchecked_ref())
        .is_ok()
    {
        slot.borrow_mut().listener = Some(cb);
    }
}
