use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// A purchasable bundle: `credits` for `price_inr` rupees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditPackage {
    pub credits: i64,
    pub price_inr: i64,
}

pub const CREDIT_PACKAGES: [CreditPackage; 2] = [
    CreditPackage {
        credits: 10,
        price_inr: 20,
    },
    CreditPackage {
        credits: 20,
        price_inr: 30,
    },
];

impl CreditPackage {
    pub fn callback_data(&self) -> String {
        format!("buy_{}", self.credits)
    }

    pub fn from_callback(data: &str) -> Option<Self> {
        let credits: i64 = data.strip_prefix("buy_")?.parse().ok()?;
        CREDIT_PACKAGES.iter().copied().find(|p| p.credits == credits)
    }
}

fn url_button(text: &str, url: &str) -> Option<InlineKeyboardButton> {
    url.parse()
        .ok()
        .map(|url| InlineKeyboardButton::url(text.to_string(), url))
}

fn telegram_link(handle: &str) -> String {
    format!("https://t.me/{}", handle.trim_start_matches('@'))
}

pub fn main_menu(support_bot: &str) -> InlineKeyboardMarkup {
    let mut rows = vec![
        vec![
            InlineKeyboardButton::callback("📦 OSINT", "osint"),
            InlineKeyboardButton::callback("👤 Profile", "profile"),
        ],
        vec![
            InlineKeyboardButton::callback("🎁 Referral", "referral"),
            InlineKeyboardButton::callback("💳 Purchase", "purchase"),
        ],
    ];
    if !support_bot.is_empty() {
        if let Some(support) = url_button("📞 Support", &telegram_link(support_bot)) {
            rows.push(vec![support]);
        }
    }
    InlineKeyboardMarkup::new(rows)
}

pub fn back_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "🔙 Back",
        "back_main",
    )]])
}

pub fn purchase_keyboard() -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = CREDIT_PACKAGES
        .iter()
        .map(|p| {
            let icon = if p.credits >= 20 { "💎" } else { "💰" };
            vec![InlineKeyboardButton::callback(
                format!("{} {}₹ = {} Credits", icon, p.price_inr, p.credits),
                p.callback_data(),
            )]
        })
        .collect();
    rows.push(vec![InlineKeyboardButton::callback("🔙 Back", "back_main")]);
    InlineKeyboardMarkup::new(rows)
}

/// Join link for the verification channel, optionally with a re-check button.
pub fn join_channel_keyboard(channel: &str, with_check: bool) -> InlineKeyboardMarkup {
    let mut row = Vec::new();
    if let Some(join) = url_button("🔗 Join Channel", &telegram_link(channel)) {
        row.push(join);
    }
    if with_check {
        row.push(InlineKeyboardButton::callback(
            "✅ Check Membership",
            "check_verify",
        ));
    }
    InlineKeyboardMarkup::new(vec![row])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packages_round_trip_through_callback_data() {
        for package in CREDIT_PACKAGES {
            assert_eq!(
                CreditPackage::from_callback(&package.callback_data()),
                Some(package)
            );
        }
        assert_eq!(CreditPackage::from_callback("buy_15"), None);
        assert_eq!(CreditPackage::from_callback("buy_"), None);
    }

    #[test]
    fn menu_has_support_row_only_when_configured() {
        assert_eq!(main_menu("").inline_keyboard.len(), 2);
        assert_eq!(main_menu("@osint_support").inline_keyboard.len(), 3);
    }
}
