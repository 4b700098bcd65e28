use crate::config::Locale;
use uuid::Uuid;

const MAX_NOTIFICATIONS: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// A one-shot message shown to the user until dismissed.
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub created_at_ms: i64,
    pub dismissed: bool,
}

impl Notification {
    fn new(kind: NotificationKind, title: &str, message: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            title: title.to_string(),
            message,
            created_at_ms: chrono::Utc::now().timestamp_millis(),
            dismissed: false,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct NotificationCenter {
    locale: Locale,
    items: Vec<Notification>,
}

impl NotificationCenter {
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            items: Vec::new(),
        }
    }

    pub fn saved(&mut self, message: Option<String>) -> &Notification {
        let (title, fallback) = match self.locale {
            Locale::Ar => ("تم الحفظ", "تم حفظ المقال بنجاح"),
            Locale::En => ("Saved", "The article was saved"),
        };
        let message = message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());
        self.push(Notification::new(NotificationKind::Success, title, message))
    }

    pub fn failed(&mut self, message: String) -> &Notification {
        let title = match self.locale {
            Locale::Ar => "تعذر الحفظ",
            Locale::En => "Save failed",
        };
        self.push(Notification::new(NotificationKind::Error, title, message))
    }

    pub fn load_failed(&mut self, message: String) -> &Notification {
        let title = match self.locale {
            Locale::Ar => "تعذر تحميل المقال",
            Locale::En => "Could not load the article",
        };
        self.push(Notification::new(NotificationKind::Error, title, message))
    }

    pub fn dismiss(&mut self, id: &str) -> bool {
        match self.items.iter_mut().find(|item| item.id == id && !item.dismissed) {
            Some(item) => {
                item.dismissed = true;
                true
            }
            None => false,
        }
    }

    pub fn active(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter().filter(|item| !item.dismissed)
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.items.last()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn push(&mut self, item: Notification) -> &Notification {
        self.items.push(item);
        if self.items.len() > MAX_NOTIFICATIONS {
            let overflow = self.items.len() - MAX_NOTIFICATIONS;
            self.items.drain(0..overflow);
        }
        &self.items[self.items.len() - 1]
    }
}
