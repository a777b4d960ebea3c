use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct StatusPanelProps {
    pub round: u32,
    pub last_gesture: Option<String>,
    pub revealed: bool,
    pub new_cookie: Callback<()>,
}

#[function_component(StatusPanel)]
pub fn status_panel(props: &StatusPanelProps) -> Html {
    let new_cookie_cb = {
        let cb = props.new_cookie.clone();
        Callback::from(move |_: web_sys::MouseEvent| cb.emit(()))
    };
    let gesture_label = props
        .last_gesture
        .clone()
        .map(|g| g.replace('_', " "))
        .unwrap_or_else(|| "-".to_string());
    html! {
        <div style="position:absolute; top:12px; left:12px; background:rgba(22,27,34,0.9); border:1px solid #30363d; border-radius:8px; padding:8px; min-width:170px; display:flex; flex-direction:column; gap:6px;">
            <div>{ format!("Cookie #{}", props.round) }</div>
            <div style="font-size:11px; opacity:0.7;">{ format!("Broken by: {}", gesture_label) }</div>
            { if props.revealed {
                html! { <button onclick={new_cookie_cb}>{"New Cookie"}</button> }
            } else {
                html! {}
            } }
        </div>
    }
}
