//! Screen builders
//!
//! Pure functions from session state to [`Screen`]s. Handlers compute the
//! selector handles first and pass them in; nothing here mutates state.

use chrono::{DateTime, Utc};

use super::action::Action;
use super::render::{Button, Keyboard, Screen};
use crate::error::Error;
use crate::gateway::ZoneSummary;
use crate::model::{EditableField, Record, RecordType, Zone, ZoneScope};
use crate::session::{SelectorToken, Session};
use crate::wizard::{AUTOMATIC_TTL, AddRecordStep};

const CONTENT_PREVIEW_CHARS: usize = 15;

/// Escape text for HTML screens
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn header(session: &Session) -> String {
    match session.active_account() {
        Some(name) => format!("👤 Account: <b>{}</b>\n\n", escape(name)),
        None => "👤 No active account\n\n".to_string(),
    }
}

fn shorten(text: &str) -> String {
    if text.chars().count() > CONTENT_PREVIEW_CHARS {
        let head: String = text.chars().take(CONTENT_PREVIEW_CHARS).collect();
        format!("{}..", head)
    } else {
        text.to_string()
    }
}

fn ttl_label(ttl: u32) -> String {
    if ttl == AUTOMATIC_TTL {
        "Auto".to_string()
    } else {
        format!("{}s", ttl)
    }
}

fn home_button() -> Button {
    Button::new("🏠 Main menu", Action::Home)
}

/// First contact with no stored account: only the way forward
pub fn onboarding() -> Screen {
    Screen::with_keyboard(
        "👋 <b>Welcome!</b>\n\nNo DNS accounts are configured yet. \
         Add your first account to get started.",
        Keyboard::new().button("➕ Add first account", Action::AddAccount),
    )
}

/// Main menu
pub fn dashboard(session: &Session) -> Screen {
    Screen::with_keyboard(
        format!("{}🏠 <b>Main menu</b>\n\nChoose what to manage.", header(session)),
        Keyboard::new()
            .button("🌐 Zones", Action::Zones)
            .row(vec![
                Button::new("📊 Global stats", Action::Stats),
                Button::new("👥 Accounts", Action::Accounts),
            ])
            .row(vec![
                Button::new("❓ Help", Action::Help),
                Button::new("🚪 Switch account", Action::Logout),
            ]),
    )
}

/// Free text with no wizard running
pub fn hint() -> Screen {
    Screen::text("Nothing is waiting for text right now. Send /start to open the menu.")
}

/// Help
pub fn help(session: &Session) -> Screen {
    let text = format!(
        "{}❓ <b>Help</b>\n\n\
         • <b>Zones</b>: browse zones, then records inside a zone.\n\
         • Open a record to edit its name, content or TTL, toggle the proxy or delete it.\n\
         • <b>Accounts</b>: add, switch or delete provider accounts.\n\
         • <b>Global stats</b>: zone counts for every stored account.\n\n\
         Buttons from an older menu may stop working after a list is refreshed; \
         open the menu again when that happens.",
        header(session)
    );
    Screen::with_keyboard(
        text,
        Keyboard::new()
            .button("🔑 How to get a token", Action::Tutorial)
            .row(vec![home_button()]),
    )
}

/// How to create a provider token
pub fn tutorial() -> Screen {
    let text = "🔑 <b>Creating an API token</b>\n\n\
                1. Open the provider dashboard and go to <i>My Profile → API Tokens</i>.\n\
                2. Choose <i>Create Token</i> and start from the <i>Edit zone DNS</i> template.\n\
                3. Under <i>Zone Resources</i> select <i>All zones</i> (or the zones to manage).\n\
                4. Create the token and copy it; it is shown only once.\n\n\
                If an account setup is in progress, simply send the token as the next message.";
    Screen::with_keyboard(
        text,
        Keyboard::new()
            .button("➕ Add account", Action::AddAccount)
            .row(vec![home_button()]),
    )
}

/// Account list with one select and one delete button per account
pub fn accounts(session: &Session, entries: &[(&str, SelectorToken)]) -> Screen {
    let mut text = format!("{}👥 <b>Accounts</b>\n\n", header(session));
    if entries.is_empty() {
        text.push_str("No accounts stored.");
    } else {
        text.push_str("Select the account to work with.");
    }

    let mut keyboard = Keyboard::new();
    for (name, token) in entries {
        let label = if session.active_account() == Some(*name) {
            format!("✅ {}", name)
        } else {
            name.to_string()
        };
        keyboard = keyboard.row(vec![
            Button::new(label, Action::SelectAccount(token.clone())),
            Button::new("🗑", Action::DeleteAccount(token.clone())),
        ]);
    }
    Screen::with_keyboard(
        text,
        keyboard
            .button("➕ Add account", Action::AddAccount)
            .row(vec![home_button()]),
    )
}

/// Account deletion confirmation
pub fn confirm_account_delete(name: &str, token: &SelectorToken) -> Screen {
    Screen::with_keyboard(
        format!(
            "⚠️ Delete account <b>{}</b>?\n\n\
             The stored token is removed; DNS data is not touched.",
            escape(name)
        ),
        Keyboard::new().row(vec![
            Button::new("✅ Delete", Action::ConfirmDeleteAccount(token.clone())),
            Button::new("❌ Cancel", Action::Accounts),
        ]),
    )
}

/// Add-account wizard: name step
pub fn account_name_prompt() -> Screen {
    Screen::with_keyboard(
        "➕ <b>New account</b>\n\nSend a name for the account (for example <code>work</code>).",
        Keyboard::new().button("❌ Cancel", Action::Accounts),
    )
}

/// Add-account wizard: token step, optionally after a failed attempt
pub fn account_token_prompt(name: &str, error: Option<&str>) -> Screen {
    let mut text = String::new();
    if let Some(error) = error {
        text.push_str(&format!("❌ {}\n\n", escape(error)));
    }
    text.push_str(&format!(
        "🔑 Send the API token for <b>{}</b>.",
        escape(name)
    ));
    Screen::with_keyboard(
        text,
        Keyboard::new()
            .button("🔑 How to get a token", Action::Tutorial)
            .button("❌ Cancel", Action::Accounts),
    )
}

/// One page of the cached zone list
pub fn zones(
    session: &Session,
    page: usize,
    pages: usize,
    entries: &[(&Zone, SelectorToken)],
) -> Screen {
    let mut text = format!("{}🌐 <b>Zones</b>", header(session));
    if entries.is_empty() {
        text.push_str("\n\nNo zones found for this account.");
        return Screen::with_keyboard(text, Keyboard::new().row(vec![home_button()]));
    }
    text.push_str(&format!(" ({} total)\n\nSelect a zone.", session.zones().len()));

    let mut keyboard = Keyboard::new();
    for (zone, token) in entries {
        let marker = if zone.is_active() { "🟢" } else { "🟡" };
        keyboard = keyboard.button(
            format!("{} {}", marker, zone.name),
            Action::OpenZone(token.clone()),
        );
    }

    if pages > 1 {
        let mut nav = Vec::new();
        if page > 0 {
            nav.push(Button::new("◀️", Action::ZonePage(page - 1)));
        }
        nav.push(Button::new(format!("{}/{}", page + 1, pages), Action::Noop));
        if page + 1 < pages {
            nav.push(Button::new("▶️", Action::ZonePage(page + 1)));
        }
        keyboard = keyboard.row(nav);
    }

    Screen::with_keyboard(text, keyboard.row(vec![home_button()]))
}

fn record_summary(record: &Record, zone: &ZoneScope) -> String {
    let proxy = if record.proxied { " ☁️" } else { "" };
    format!(
        "{} {} → {}{}",
        record.record_type,
        record.short_name(&zone.name),
        shorten(&record.content),
        proxy
    )
}

/// Record list of the current zone
pub fn records(
    session: &Session,
    zone: &ZoneScope,
    entries: &[(&Record, SelectorToken)],
) -> Screen {
    let mut text = format!("{}📂 Zone: <b>{}</b>\n\n", header(session), escape(&zone.name));
    if entries.is_empty() {
        text.push_str("This zone has no records.");
    } else {
        text.push_str(&format!("{} records. Select one to manage it.", entries.len()));
    }

    let mut keyboard = Keyboard::new();
    for (record, token) in entries {
        keyboard = keyboard.button(record_summary(record, zone), Action::OpenRecord(token.clone()));
    }
    Screen::with_keyboard(
        text,
        keyboard
            .row(vec![
                Button::new("➕ Add record", Action::NewRecord),
                Button::new("🔄 Refresh", Action::RefreshRecords),
            ])
            .row(vec![Button::new("⬅️ Zones", Action::Zones), home_button()]),
    )
}

/// Record detail with its actions
pub fn record_detail(
    session: &Session,
    zone: &ZoneScope,
    record: &Record,
    token: &SelectorToken,
) -> Screen {
    let text = format!(
        "{}📝 <b>Record</b> in {}\n\n\
         Type: <code>{}</code>\n\
         Name: <code>{}</code>\n\
         Content: <code>{}</code>\n\
         TTL: {}\n\
         Proxy: {}",
        header(session),
        escape(&zone.name),
        escape(&record.record_type),
        escape(&record.name),
        escape(&record.content),
        ttl_label(record.ttl),
        if record.proxied { "☁️ On" } else { "Off" },
    );

    let keyboard = Keyboard::new()
        .row(vec![
            Button::new("✏️ Name", Action::EditField(EditableField::Name, token.clone())),
            Button::new("✏️ Content", Action::EditField(EditableField::Content, token.clone())),
            Button::new("✏️ TTL", Action::EditField(EditableField::Ttl, token.clone())),
        ])
        .row(vec![
            Button::new("☁️ Proxy", Action::ToggleProxy(token.clone())),
            Button::new("🗑 Delete", Action::AskDeleteRecord(token.clone())),
        ])
        .row(vec![Button::new("⬅️ Records", Action::Records), home_button()]);

    Screen::with_keyboard(text, keyboard)
}

/// Proxy choice for an existing record
pub fn proxy_choice(record: &Record, token: &SelectorToken) -> Screen {
    Screen::with_keyboard(
        format!(
            "☁️ Proxy for <b>{}</b> (currently {}).",
            escape(&record.name),
            if record.proxied { "on" } else { "off" }
        ),
        Keyboard::new()
            .row(vec![
                Button::new("☁️ Proxied", Action::SetProxy(true, token.clone())),
                Button::new("DNS only", Action::SetProxy(false, token.clone())),
            ])
            .button("⬅️ Back", Action::OpenRecord(token.clone())),
    )
}

/// Record deletion confirmation
pub fn confirm_record_delete(record: &Record, token: &SelectorToken) -> Screen {
    Screen::with_keyboard(
        format!(
            "⚠️ Delete <code>{}</code> record <b>{}</b>?",
            escape(&record.record_type),
            escape(&record.name)
        ),
        Keyboard::new().row(vec![
            Button::new("✅ Delete", Action::ConfirmDeleteRecord(token.clone())),
            Button::new("❌ Cancel", Action::OpenRecord(token.clone())),
        ]),
    )
}

/// Add-record wizard prompt for `step`
pub fn add_record_prompt(zone: &ZoneScope, step: &AddRecordStep) -> Screen {
    let cancel = || Keyboard::new().button("❌ Cancel", Action::Records);
    let title = format!("➕ <b>New record</b> in {}\n\n", escape(&zone.name));

    match step {
        AddRecordStep::Type => {
            let types: Vec<Button> = RecordType::ALL
                .iter()
                .map(|t| Button::new(t.as_str(), Action::PickType(*t)))
                .collect();
            let (first, second) = types.split_at(types.len() / 2);
            Screen::with_keyboard(
                format!("{}Choose the record type.", title),
                Keyboard::new()
                    .row(first.to_vec())
                    .row(second.to_vec())
                    .button("❌ Cancel", Action::Records),
            )
        }
        AddRecordStep::Name { record_type } => Screen::with_keyboard(
            format!(
                "{}Type: <code>{}</code>\nSend the record name \
                 (<code>@</code> for the zone apex, or e.g. <code>www</code>).",
                title, record_type
            ),
            cancel(),
        ),
        AddRecordStep::Content { record_type, .. } => {
            let example = match record_type {
                RecordType::A => "an IPv4 address",
                RecordType::Aaaa => "an IPv6 address",
                RecordType::Cname | RecordType::Mx | RecordType::Ns => "a host name",
                RecordType::Txt => "the text value",
            };
            Screen::with_keyboard(format!("{}Send the content ({}).", title, example), cancel())
        }
        AddRecordStep::Ttl { .. } => Screen::with_keyboard(
            format!(
                "{}Send the TTL in seconds. Anything other than a positive number means automatic.",
                title
            ),
            cancel(),
        ),
        AddRecordStep::Proxied { .. } => Screen::with_keyboard(
            format!("{}Proxy traffic through the provider?", title),
            Keyboard::new()
                .row(vec![
                    Button::new("☁️ Proxied", Action::PickProxied(true)),
                    Button::new("DNS only", Action::PickProxied(false)),
                ])
                .button("❌ Cancel", Action::Records),
        ),
    }
}

/// Edit-field wizard prompt
pub fn edit_prompt(field: EditableField, record: &Record, cancel: Action) -> Screen {
    let current = match field {
        EditableField::Name => escape(&record.name),
        EditableField::Content => escape(&record.content),
        EditableField::Ttl => ttl_label(record.ttl),
    };
    Screen::with_keyboard(
        format!(
            "✏️ Send the new {} for <b>{}</b>.\nCurrent: <code>{}</code>",
            field.label(),
            escape(&record.name),
            current
        ),
        Keyboard::new().button("❌ Cancel", cancel),
    )
}

/// Screen shown after a failed mutation; the wizard is already gone
pub fn operation_failed(message: &str, back: Action) -> Screen {
    Screen::with_keyboard(
        format!("❌ <b>Operation failed</b>\n\n{}", escape(message)),
        Keyboard::new().button("⬅️ Back", back).row(vec![home_button()]),
    )
}

/// Zone counts across every account
pub fn stats(
    session: &Session,
    summaries: &[(String, crate::Result<ZoneSummary>)],
    generated_at: DateTime<Utc>,
) -> Screen {
    let mut text = format!("{}📊 <b>Global stats</b>\n\n", header(session));
    if summaries.is_empty() {
        text.push_str("No accounts stored.\n");
    }

    let mut total = ZoneSummary::default();
    for (name, summary) in summaries {
        match summary {
            Ok(summary) => {
                total.total += summary.total;
                total.active += summary.active;
                total.pending += summary.pending;
                text.push_str(&format!(
                    "<b>{}</b>: {} zones ({} active, {} pending)\n",
                    escape(name),
                    summary.total,
                    summary.active,
                    summary.pending
                ));
            }
            Err(Error::RemoteRejected(_) | Error::InvalidCredential(_)) => {
                text.push_str(&format!("<b>{}</b>: ⚠️ token invalid/expired\n", escape(name)));
            }
            Err(_) => {
                text.push_str(&format!("<b>{}</b>: ⚠️ connection error\n", escape(name)));
            }
        }
    }

    text.push_str(&format!(
        "\nTotal: {} zones ({} active, {} pending)\n<i>Updated {}</i>",
        total.total,
        total.active,
        total.pending,
        generated_at.format("%Y-%m-%d %H:%M UTC")
    ));

    Screen::with_keyboard(
        text,
        Keyboard::new()
            .button("🔄 Refresh", Action::Stats)
            .row(vec![home_button()]),
    )
}
