use std::time::Duration;

use {
    gloo::console::log,
    std::{cell::RefCell, sync::Mutex},
    yew::Callback,
};

// Set by the mounted manager, the reporter pushes through it
thread_local! {
    static CALLBACK: RefCell<Option<Callback<Notification>>> = const { RefCell::new(None) };
}
static CURRENT_ID: Mutex<u32> = Mutex::new(0);

/// Shows `notification` if a [`NotificationManager`] is mounted, drops it otherwise.
pub fn push_notification(notification: Notification) {
    CALLBACK.with_borrow(|cb_opt| {
        let Some(cb) = cb_opt else {
            return;
        };
        cb.emit(notification)
    });
}

pub fn is_mounted() -> bool {
    CALLBACK.with_borrow(Option::is_some)
}

/// Time on screen, NaN and negatives expire at once.
fn expiry(timeout_s: f64) -> Duration {
    if timeout_s.is_nan() {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(timeout_s.min(crate::config::MAX_NOTIFICATION_TIMEOUT_S))
        .unwrap_or(Duration::ZERO)
}

fn new_id() -> u32 {
    let mut guard = CURRENT_ID
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard += 1;
    *guard - 1
}

pub enum Message {
    Push(Notification),
    RemoveAnimation { id: u32 },
    Remove { id: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NotificationStyle {
    Info,
    Error,
}

#[derive(Debug, PartialEq)]
pub struct Notification {
    id: u32,
    expired: bool,
    timeout_s: f64,
    title: String,
    content: Vec<String>,
    style: NotificationStyle,
}

impl Notification {
    pub fn new(title: &str, content: Vec<&str>, timeout_s: f64, style: NotificationStyle) -> Self {
        Self {
            id: new_id(),
            expired: false,
            timeout_s,
            title: title.to_string(),
            content: content
                .into_iter()
                .filter(|line| !line.is_empty())
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
            style,
        }
    }

    pub fn info(title: &str, content: Vec<&str>, timeout_s: f64) -> Self {
        Self::new(title, content, timeout_s, NotificationStyle::Info)
    }

    pub fn error(title: &str, content: Vec<&str>, timeout_s: f64) -> Self {
        Self::new(title, content, timeout_s, NotificationStyle::Error)
    }

    pub fn style(&self) -> NotificationStyle {
        self.style
    }

    fn class(&self) -> String {
        format!(
            "notification{}{}",
            if self.expired {
                " notification_expired"
            } else {
                ""
            },
            match self.style {
                NotificationStyle::Info => " notification_info",
                NotificationStyle::Error => " notification_error",
            }
        )
    }

    fn render(&self) -> yew::Html {
        yew::html! {<div class={ self.class() }>
            <div class="notification_title">{
                &self.title
            }</div>
            <div class="notification_content">{
                for self.content.iter().map(|bit|{
                    yew::html!{<>{
                        bit
                    }
                    <br />
                    </>}
                })
            }</div>
        </div>}
    }
}

pub struct NotificationManager {
    notifications: Vec<Notification>,
}

impl yew::Component for NotificationManager {
    type Message = Message;
    type Properties = ();

    fn create(ctx: &yew::Context<Self>) -> Self {
        CALLBACK.set(Some(ctx.link().callback(Message::Push)));
        Self {
            notifications: Vec::new(),
        }
    }

    fn update(&mut self, ctx: &yew::Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Message::Push(notification) => {
                let id = notification.id;
                let timeout = expiry(notification.timeout_s);
                ctx.link().send_future(async move {
                    gloo_timers::future::sleep(timeout).await;
                    Message::RemoveAnimation { id }
                });
                self.notifications.push(notification);
            }
            Message::RemoveAnimation { id } => {
                let Some(notification) = self.notifications.iter_mut().find(|n| n.id == id)
                else {
                    log!(format!("Notification {id} expired but was not displayed"));
                    return false;
                };

                notification.expired = true;
                ctx.link().send_future(async move {
                    // 1/10 of the css fade out
                    gloo_timers::future::sleep(Duration::from_secs_f64(0.1)).await;
                    Message::Remove { id }
                });
            }
            Message::Remove { id } => {
                self.notifications.retain(|n| n.id != id);
            }
        }
        true
    }

    fn view(&self, _ctx: &yew::Context<Self>) -> yew::Html {
        yew::html! {<div class="notification_block">{
            for self.notifications.iter().map(Notification::render)
        }</div>}
    }

    fn destroy(&mut self, _ctx: &yew::Context<Self>) {
        CALLBACK.set(None);
    }
}
