use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct IntroOverlayProps {
    pub show: bool,
    pub dismiss: Callback<()>,
}

#[function_component(IntroOverlay)]
pub fn intro_overlay(props: &IntroOverlayProps) -> Html {
    if !props.show {
        return html! {};
    }
    let dismiss_cb = props.dismiss.clone();
    let dismiss_btn = Callback::from(move |_| dismiss_cb.emit(()));
    html! {
        <div style="position:absolute; top:50%; left:50%; transform:translate(-50%, -50%); background:rgba(0,0,0,0.87); border:2px solid #30363d; padding:28px 36px; border-radius:14px; max-width:480px; width:90%; box-shadow:0 0 0 1px #1a1f24, 0 6px 18px rgba(0,0,0,0.6); font-size:14px; line-height:1.4;">
            <h2 style="margin:0 0 12px 0; font-size:22px; color:#e8b44a; text-align:center;">{"Fortune Smash"}</h2>
            <p style="margin:4px 0 10px 0; text-align:center; opacity:0.85;">{"Break the cookie any way you like. Your fortune is inside."}</p>
            <ul style="margin:0 0 12px 18px; padding:0; list-style:disc; display:flex; flex-direction:column; gap:4px;">
                <li>{"Click it once for a clean smash."}</li>
                <li>{"Double-tap for a sharper crack."}</li>
                <li>{"Drag it hard and let go to fling it apart."}</li>
                <li>{"Wiggle the pointer over it (or shake your phone) until it shatters."}</li>
                <li>{"Press and hold to squeeze it until it gives."}</li>
            </ul>
            <div style="display:flex; gap:12px; justify-content:center; margin-top:8px;">
                <button onclick={dismiss_btn}>{"Start"}</button>
            </div>
        </div>
    }
}
