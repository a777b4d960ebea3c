use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, MouseEvent, TouchEvent};
use yew::prelude::*;

mod components;
mod controller;
mod gesture;
mod model;
mod motion;
mod particles;
mod physics;
mod render;
mod state;
mod util;

use components::{IntroOverlay, StatusPanel};
use controller::CookieController;
use model::{SessionAction, SessionState};
use motion::MotionShake;
use render::{CANVAS_H, CANVAS_W};
use util::clog;

// Demo payloads; a real host feeds its own string per round.
const FORTUNES: [&str; 6] = [
    "A fresh start will put you on your way.",
    "The smallest crack lets in the most light.",
    "Patience is bitter, but its fruit is sweet.",
    "You will soon break free of old habits.",
    "An unexpected gesture opens a new door.",
    "Fortune favors the one who squeezes hardest.",
];

fn fortune_for(round: u32) -> String {
    FORTUNES[(round as usize - 1) % FORTUNES.len()].to_string()
}

fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

/// Event client coords -> canvas logical pixels, one scale transform
/// off the bounding rect (shared by mouse and touch).
fn canvas_coords(canvas: &HtmlCanvasElement, client_x: f64, client_y: f64) -> (f64, f64) {
    let rect = canvas.get_bounding_client_rect();
    let sx = if rect.width() > 0.0 { CANVAS_W / rect.width() } else { 1.0 };
    let sy = if rect.height() > 0.0 { CANVAS_H / rect.height() } else { 1.0 };
    ((client_x - rect.left()) * sx, (client_y - rect.top()) * sy)
}

#[derive(Properties, PartialEq, Clone)]
struct CookieViewProps {
    pub session: UseReducerHandle<SessionState>,
}

#[function_component(CookieView)]
fn cookie_view(props: &CookieViewProps) -> Html {
    let canvas_ref = use_node_ref();
    let controller_ref = use_mut_ref(|| None::<Rc<RefCell<CookieController>>>);

    // Keep the core's payload in sync with the session's fortune.
    {
        let controller_ref = controller_ref.clone();
        let fortune = props.session.fortune.clone();
        use_effect_with(fortune.clone(), move |_| {
            if let Some(c) = &*controller_ref.borrow() {
                c.borrow_mut().set_payload(fortune);
            }
            || ()
        });
    }

    {
        let canvas_ref = canvas_ref.clone();
        let controller_ref = controller_ref.clone();
        let session = props.session.clone();

        use_effect_with((), move |_| {
            let window = web_sys::window().expect("no global `window` exists");
            let canvas: HtmlCanvasElement = canvas_ref
                .cast::<HtmlCanvasElement>()
                .expect("canvas_ref not attached to a canvas element");

            let controller = Rc::new(RefCell::new(CookieController::new()));
            *controller_ref.borrow_mut() = Some(controller.clone());

            #[cfg(target_arch = "wasm32")]
            if !controller.borrow_mut().renderer_mut().attach(&canvas) {
                clog("2d context unavailable; cookie will not render");
            }
            controller
                .borrow_mut()
                .set_payload(session.fortune.clone());

            // Host callbacks -> session reducer.
            {
                let mut c = controller.borrow_mut();
                let session_break = session.clone();
                c.set_on_break(move |kind, force| {
                    session_break.dispatch(SessionAction::CookieBroken {
                        gesture: kind.as_str().to_string(),
                        force,
                    });
                });
                let session_reveal = session.clone();
                c.set_on_fortune_reveal(move || {
                    session_reveal.dispatch(SessionAction::FortuneRevealed);
                });
                c.set_on_new_cookie(|| clog("new cookie"));
            }

            let cancelled = Rc::new(Cell::new(false));
            let motion_slot: Rc<RefCell<Option<Rc<RefCell<MotionShake>>>>> =
                Rc::new(RefCell::new(None));
            let motion_requested = Rc::new(Cell::new(false));

            // Mouse down
            let mousedown_cb = {
                let canvas = canvas.clone();
                let controller = controller.clone();
                Closure::wrap(Box::new(move |e: MouseEvent| {
                    if e.button() != 0 {
                        return;
                    }
                    let (x, y) = canvas_coords(&canvas, e.client_x() as f64, e.client_y() as f64);
                    controller.borrow_mut().pointer_down(x, y, now_ms());
                }) as Box<dyn FnMut(_)>)
            };
            canvas
                .add_event_listener_with_callback("mousedown", mousedown_cb.as_ref().unchecked_ref())
                .ok();

            // Mouse move
            let mousemove_cb = {
                let canvas = canvas.clone();
                let controller = controller.clone();
                Closure::wrap(Box::new(move |e: MouseEvent| {
                    let (x, y) = canvas_coords(&canvas, e.client_x() as f64, e.client_y() as f64);
                    controller.borrow_mut().pointer_move(x, y, now_ms());
                }) as Box<dyn FnMut(_)>)
            };
            canvas
                .add_event_listener_with_callback("mousemove", mousemove_cb.as_ref().unchecked_ref())
                .ok();

            // Mouse up on the window so releases outside the canvas
            // still end the gesture.
            let mouseup_cb = {
                let canvas = canvas.clone();
                let controller = controller.clone();
                Closure::wrap(Box::new(move |e: MouseEvent| {
                    let (x, y) = canvas_coords(&canvas, e.client_x() as f64, e.client_y() as f64);
                    controller.borrow_mut().pointer_up(x, y, now_ms());
                }) as Box<dyn FnMut(_)>)
            };
            window
                .add_event_listener_with_callback("mouseup", mouseup_cb.as_ref().unchecked_ref())
                .ok();

            // Touch
            let touch_start_cb = {
                let canvas = canvas.clone();
                let controller = controller.clone();
                let motion_slot = motion_slot.clone();
                let motion_requested = motion_requested.clone();
                let cancelled = cancelled.clone();
                Closure::wrap(Box::new(move |e: TouchEvent| {
                    // The permission prompt only works as the first
                    // async call inside a user gesture, so request it
                    // before any other handling on the first touch.
                    if !motion_requested.get() {
                        motion_requested.set(true);
                        *motion_slot.borrow_mut() =
                            Some(MotionShake::enable(controller.clone(), cancelled.clone()));
                    }
                    if let Some(t0) = e.touches().item(0) {
                        let (x, y) =
                            canvas_coords(&canvas, t0.client_x() as f64, t0.client_y() as f64);
                        controller.borrow_mut().pointer_down(x, y, now_ms());
                    }
                    e.prevent_default();
                }) as Box<dyn FnMut(_)>)
            };
            canvas
                .add_event_listener_with_callback(
                    "touchstart",
                    touch_start_cb.as_ref().unchecked_ref(),
                )
                .ok();

            let touch_move_cb = {
                let canvas = canvas.clone();
                let controller = controller.clone();
                Closure::wrap(Box::new(move |e: TouchEvent| {
                    if let Some(t0) = e.touches().item(0) {
                        let (x, y) =
                            canvas_coords(&canvas, t0.client_x() as f64, t0.client_y() as f64);
                        controller.borrow_mut().pointer_move(x, y, now_ms());
                    }
                    e.prevent_default();
                }) as Box<dyn FnMut(_)>)
            };
            canvas
                .add_event_listener_with_callback(
                    "touchmove",
                    touch_move_cb.as_ref().unchecked_ref(),
                )
                .ok();

            let touch_end_cb = {
                let canvas = canvas.clone();
                let controller = controller.clone();
                Closure::wrap(Box::new(move |e: TouchEvent| {
                    if let Some(t0) = e.changed_touches().item(0) {
                        let (x, y) =
                            canvas_coords(&canvas, t0.client_x() as f64, t0.client_y() as f64);
                        controller.borrow_mut().pointer_up(x, y, now_ms());
                    }
                    e.prevent_default();
                }) as Box<dyn FnMut(_)>)
            };
            canvas
                .add_event_listener_with_callback("touchend", touch_end_cb.as_ref().unchecked_ref())
                .ok();
            canvas
                .add_event_listener_with_callback(
                    "touchcancel",
                    touch_end_cb.as_ref().unchecked_ref(),
                )
                .ok();

            // Animation loop: physics step, gesture tick, redraw.
            let raf_id = Rc::new(RefCell::new(None));
            let closure_cell: Rc<RefCell<Option<Closure<dyn FnMut()>>>> =
                Rc::new(RefCell::new(None));
            {
                let raf_id_loop = raf_id.clone();
                let closure_cell_loop = closure_cell.clone();
                let window_loop = window.clone();
                let controller_loop = controller.clone();
                let cancelled_loop = cancelled.clone();
                *closure_cell.borrow_mut() = Some(Closure::wrap(Box::new(move || {
                    if cancelled_loop.get() {
                        return;
                    }
                    controller_loop.borrow_mut().frame(now_ms());
                    if let Some(cb) = closure_cell_loop.borrow().as_ref() {
                        if let Ok(id) =
                            window_loop.request_animation_frame(cb.as_ref().unchecked_ref())
                        {
                            *raf_id_loop.borrow_mut() = Some(id);
                        }
                    }
                }) as Box<dyn FnMut()>));
                if let Some(cb) = closure_cell.borrow().as_ref() {
                    if let Ok(id) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                        *raf_id.borrow_mut() = Some(id);
                    }
                }
            }

            let window_clone = window.clone();
            move || {
                cancelled.set(true);
                let _ = canvas.remove_event_listener_with_callback(
                    "mousedown",
                    mousedown_cb.as_ref().unchecked_ref(),
                );
                let _ = canvas.remove_event_listener_with_callback(
                    "mousemove",
                    mousemove_cb.as_ref().unchecked_ref(),
                );
                let _ = window_clone.remove_event_listener_with_callback(
                    "mouseup",
                    mouseup_cb.as_ref().unchecked_ref(),
                );
                let _ = canvas.remove_event_listener_with_callback(
                    "touchstart",
                    touch_start_cb.as_ref().unchecked_ref(),
                );
                let _ = canvas.remove_event_listener_with_callback(
                    "touchmove",
                    touch_move_cb.as_ref().unchecked_ref(),
                );
                let _ = canvas.remove_event_listener_with_callback(
                    "touchend",
                    touch_end_cb.as_ref().unchecked_ref(),
                );
                let _ = canvas.remove_event_listener_with_callback(
                    "touchcancel",
                    touch_end_cb.as_ref().unchecked_ref(),
                );
                if let Some(id) = *raf_id.borrow() {
                    let _ = window_clone.cancel_animation_frame(id);
                }
                if let Some(m) = motion_slot.borrow_mut().take() {
                    m.borrow_mut().detach();
                }
                controller.borrow_mut().destroy();
                let _keep_alive = (
                    &mousedown_cb,
                    &mousemove_cb,
                    &mouseup_cb,
                    &touch_start_cb,
                    &touch_move_cb,
                    &touch_end_cb,
                    &closure_cell,
                );
            }
        });
    }

    let new_cookie = {
        let session = props.session.clone();
        let controller_ref = controller_ref.clone();
        Callback::from(move |_| {
            let next = fortune_for(session.round + 1);
            if let Some(c) = &*controller_ref.borrow() {
                let mut c = c.borrow_mut();
                c.set_payload(next.clone());
                c.reset();
            }
            session.dispatch(SessionAction::NewCookie { fortune: next });
        })
    };

    html! {
        <>
            <canvas
                ref={canvas_ref.clone()}
                id="cookie-canvas"
                style="display:block; background:#161b22; border-radius:12px; max-width:100%; touch-action:none;"
            ></canvas>
            <StatusPanel
                round={props.session.round}
                last_gesture={props.session.last_gesture.clone()}
                revealed={props.session.revealed}
                new_cookie={new_cookie}
            />
        </>
    }
}

#[function_component(App)]
fn app() -> Html {
    let session = use_reducer(|| SessionState::new(fortune_for(1)));
    let show_intro = use_state(|| true);

    let dismiss_intro = {
        let show_intro = show_intro.clone();
        Callback::from(move |_| show_intro.set(false))
    };

    html! {
        <div style="position:relative; width:100vw; height:100vh; display:flex; align-items:center; justify-content:center; background:#0e1116; color:#e6edf3;">
            <CookieView session={session.clone()} />
            <IntroOverlay show={*show_intro} dismiss={dismiss_intro} />
        </div>
    }
}

fn main() {
    yew::Renderer::<App>::new().render();
}
