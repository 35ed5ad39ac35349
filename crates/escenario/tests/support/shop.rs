//! The sample shop, rebuilt on `MockPage`.
//!
//! Three pages: the login form at `/`, the product list at `/items` with a
//! checkout modal, and the order summary at `/summary`. Authentication
//! reproduces the live site's known defect: the password comparison
//! ignores case.

use escenario::catalog::INVALID_LOGIN;
use escenario::mock::{MockPage, NodeId, BODY};
use escenario::{Selector, SuiteConfig};

pub const ORIGIN: &str = "https://shop.test";

/// (name, price, variant label, variant values)
pub const PRODUCTS: [(&str, &str, &str, &[&str]); 5] = [
    ("Shirt", "30", "Size Shirt:", &["S", "M", "L", "XL"]),
    (
        "Shoe",
        "60",
        "Size Shoe:",
        &["38", "39", "40", "41", "42", "43", "44", "45"],
    ),
    ("Cap", "15", "Type:", &["Snapback", "Bucket", "Beanie"]),
    ("Perfume", "45", "Scent:", &["Floral", "Woody", "Citrus"]),
    ("Jam Tangan", "120", "Color:", &["Hitam", "Silver", "Coklat"]),
];

const USER_KEY: &str = "user";
const ORDER_KEY: &str = "order";
const CUSTOMER_KEY: &str = "customer";

/// Configuration pointing at the simulated shop with short budgets
pub fn config() -> SuiteConfig {
    let mut config = SuiteConfig::new()
        .with_base_url(format!("{ORIGIN}/"))
        .with_command_timeout(1_000)
        .with_scenario_timeout(20_000);
    config.screenshot = false;
    config
}

/// A fresh browser context on the shop
pub fn shop() -> MockPage {
    shop_with_auth(authenticate)
}

/// The shop with a different credential check
pub fn shop_with_auth(auth: fn(&str, &str) -> bool) -> MockPage {
    MockPage::new(ORIGIN)
        .with_route("/", move |page| login_page(page, auth))
        .with_route("/items", items_page)
        .with_route("/summary", summary_page)
}

/// A broken shop: a rejected login still raises the alert, then lets the
/// visitor through to `/items`
pub fn shop_admitting_rejected_logins() -> MockPage {
    shop().with_route("/", |page| {
        login_page(page, authenticate);
        let form = node(page, &Selector::class("login-form"));
        page.on_submit(form, |page, _| {
            if page.path() == "/" {
                let _ = page
                    .session_storage_mut()
                    .insert(USER_KEY.to_string(), "intruder".to_string());
                page.redirect("/items");
            }
        });
    })
}

/// Credential check of the live site, defect included
pub fn authenticate(username: &str, password: &str) -> bool {
    username.trim().eq_ignore_ascii_case("alain") && password.trim().eq_ignore_ascii_case("alain1234")
}

/// Exact comparison, as the site should behave
pub fn authenticate_strictly(username: &str, password: &str) -> bool {
    username == "alain" && password == "alain1234"
}

fn value_of(page: &MockPage, id: &str) -> String {
    page.find_first(&Selector::id(id))
        .map(|node| page.value(node))
        .unwrap_or_default()
}

fn node(page: &MockPage, selector: &Selector) -> NodeId {
    page.find_first(selector).unwrap_or(BODY)
}

// =============================================================================
// Login
// =============================================================================

fn login_page(page: &mut MockPage, auth: fn(&str, &str) -> bool) {
    page.set_title("My Shop - Login");
    let form = page.element(BODY, "form", &[("class", "login-form")], "");
    let _ = page.element(form, "label", &[("for", "username")], "Username");
    let _ = page.element(form, "input", &[("id", "username"), ("type", "text")], "");
    let _ = page.element(form, "label", &[("for", "password")], "Password");
    let _ = page.element(form, "input", &[("id", "password"), ("type", "password")], "");
    let _ = page.element(form, "button", &[("type", "submit")], "Login");
    page.on_submit(form, move |page, _| {
        let username = value_of(page, "username");
        let password = value_of(page, "password");
        if auth(&username, &password) {
            let _ = page
                .session_storage_mut()
                .insert(USER_KEY.to_string(), username.trim().to_lowercase());
            page.redirect("/items");
        } else {
            page.alert(INVALID_LOGIN);
        }
    });
}

// =============================================================================
// Items and checkout modal
// =============================================================================

fn items_page(page: &mut MockPage) {
    if !page.session_storage().contains_key(USER_KEY) {
        page.redirect("/");
        return;
    }
    page.set_title("My Shop - Items");
    let _ = page.element(BODY, "h2", &[], "Select Your Items");
    let form = page.element(BODY, "form", &[("id", "itemsForm")], "");
    for (name, price, variant, values) in PRODUCTS {
        let item = page.element(
            form,
            "div",
            &[("class", "item"), ("data-name", name), ("data-price", price)],
            "",
        );
        let _ = page.element(
            item,
            "input",
            &[("type", "checkbox"), ("name", "items"), ("value", name)],
            "",
        );
        let _ = page.element(item, "span", &[("class", "item-name")], name);
        let label = page.element(item, "label", &[], variant);
        let _ = page.select(label, &[("class", "size-selector")], values);
        let _ = page.element(
            item,
            "input",
            &[
                ("type", "number"),
                ("class", "quantity-input"),
                ("min", "1"),
                ("value", "1"),
                ("required", ""),
            ],
            "",
        );
    }
    let _ = page.element(
        form,
        "button",
        &[("type", "submit"), ("class", "submit-btn")],
        "Proceed to Checkout",
    );

    let modal = page.element(
        BODY,
        "div",
        &[("id", "checkoutModal"), ("class", "modal"), ("hidden", "")],
        "",
    );
    let content = page.element(modal, "div", &[("class", "modal-content")], "");
    page.on_submit(form, move |page, _| {
        let order = selected_items(page);
        page.clear_children(content);
        if order.is_empty() {
            let _ = page.element(content, "p", &[("class", "notice")], "Please select at least one item.");
            let close = page.element(content, "button", &[("type", "button")], "OK");
            page.on_click(close, move |page, _| page.set_hidden(modal, true));
        } else {
            let _ = page
                .session_storage_mut()
                .insert(ORDER_KEY.to_string(), order.join(";"));
            customer_form(page, modal, content);
        }
        page.set_hidden(modal, false);
    });
}

/// `name|variant|qty` for every checked product
fn selected_items(page: &MockPage) -> Vec<String> {
    PRODUCTS
        .iter()
        .filter_map(|(name, ..)| {
            let checkbox = page.find_first(&Selector::checkbox(*name))?;
            if !page.is_checked(checkbox) {
                return None;
            }
            let item = escenario::AttributeSelector::class("item").attr("data-name", *name);
            let variant = node(page, &Selector::class("size-selector").within(item.clone()));
            let qty = node(page, &Selector::class("quantity-input").within(item));
            Some(format!("{name}|{}|{}", page.value(variant), page.value(qty)))
        })
        .collect()
}

fn customer_form(page: &mut MockPage, modal: NodeId, content: NodeId) {
    let _ = page.element(content, "h3", &[], "Customer Details");
    let form = page.element(content, "form", &[("id", "customerForm")], "");

    let group = page.element(form, "div", &[("class", "form-group")], "");
    let _ = page.element(group, "label", &[("for", "customerName")], "Name");
    let _ = page.element(
        group,
        "input",
        &[("id", "customerName"), ("type", "text"), ("placeholder", "Enter your name")],
        "",
    );

    let group = page.element(form, "div", &[("class", "form-group")], "");
    let label = page.element(group, "label", &[("for", "customerPhone")], "Phone Number ");
    let _ = page.element(label, "span", &[("class", "required")], "*");
    let _ = page.element(
        group,
        "input",
        &[
            ("id", "customerPhone"),
            ("type", "tel"),
            ("placeholder", "Enter your phone number"),
            ("required", ""),
        ],
        "",
    );
    let error = page.element(group, "p", &[("id", "phoneError"), ("class", "error"), ("hidden", "")], "");

    let group = page.element(form, "div", &[("class", "form-group")], "");
    let label = page.element(group, "label", &[("for", "customerAddress")], "Address ");
    let _ = page.element(label, "span", &[("class", "required")], "*");
    let _ = page.element(
        group,
        "textarea",
        &[
            ("id", "customerAddress"),
            ("placeholder", "Enter your full address"),
            ("required", ""),
        ],
        "",
    );

    let actions = page.element(form, "div", &[("class", "modal-actions")], "");
    let proceed = page.element(actions, "button", &[("id", "proceedBtn"), ("type", "button")], "Proceed");
    let cancel = page.element(actions, "button", &[("id", "cancelBtn"), ("type", "button")], "Cancel");

    let confirm = page.element(content, "div", &[("id", "confirmBox"), ("hidden", "")], "");
    let _ = page.element(confirm, "p", &[], "Confirm your order?");
    let yes = page.element(confirm, "button", &[("id", "confirmYes"), ("type", "button")], "Yes");
    let no = page.element(confirm, "button", &[("id", "confirmNo"), ("type", "button")], "No");

    page.on_click(proceed, move |page, _| {
        let name = value_of(page, "customerName");
        let phone = value_of(page, "customerPhone");
        let address = value_of(page, "customerAddress");
        if phone.trim().is_empty() || address.trim().is_empty() {
            return;
        }
        if !valid_phone(&phone) {
            page.set_text(error, "Please enter a valid phone number");
            page.set_hidden(error, false);
            return;
        }
        page.set_hidden(error, true);
        let _ = page
            .session_storage_mut()
            .insert(CUSTOMER_KEY.to_string(), format!("{name}|{phone}|{address}"));
        page.set_hidden(confirm, false);
    });
    page.on_click(cancel, move |page, _| page.set_hidden(modal, true));
    page.on_click(no, move |page, _| page.set_hidden(confirm, true));
    page.on_click(yes, |page, _| page.redirect("/summary"));
}

fn valid_phone(phone: &str) -> bool {
    phone.chars().all(|c| c.is_ascii_digit() || " ()+-".contains(c))
        && phone.chars().filter(char::is_ascii_digit).count() >= 6
}

// =============================================================================
// Summary
// =============================================================================

fn price_of(name: &str) -> u64 {
    PRODUCTS
        .iter()
        .find(|(n, ..)| *n == name)
        .and_then(|(_, price, ..)| price.parse().ok())
        .unwrap_or_default()
}

fn summary_page(page: &mut MockPage) {
    let customer = page
        .session_storage()
        .get(CUSTOMER_KEY)
        .cloned()
        .unwrap_or_default();
    let order = page.session_storage().get(ORDER_KEY).cloned().unwrap_or_default();
    page.set_title("My Shop - Summary");

    let summary = page.element(BODY, "div", &[("class", "summary-content")], "");
    let _ = page.element(summary, "h2", &[], "Order Summary");

    let details = page.element(summary, "div", &[("id", "customerDetails")], "");
    let mut fields = customer.splitn(3, '|');
    for label in ["Name", "Phone", "Address"] {
        let value = fields.next().unwrap_or_default();
        let _ = page.element(details, "p", &[], &format!("{label}: {value}"));
    }

    let items = page.element(summary, "div", &[("class", "items-section")], "");
    let mut total = 0;
    for line in order.split(';').filter(|l| !l.is_empty()) {
        let mut parts = line.split('|');
        let name = parts.next().unwrap_or_default();
        let variant = parts.next().unwrap_or_default();
        let qty: u64 = parts.next().and_then(|q| q.parse().ok()).unwrap_or_default();
        total += qty * price_of(name);
        let _ = page.element(items, "p", &[("class", "line")], &format!("{name} ({variant}) x{qty}"));
    }
    let _ = page.element(summary, "div", &[("class", "total-section")], &format!("Total: ${total}"));

    let buttons = page.element(summary, "div", &[("class", "action-buttons")], "");
    let back = page.element(buttons, "button", &[("type", "button")], "Back to Items");
    page.on_click(back, |page, _| page.redirect("/items"));
}
