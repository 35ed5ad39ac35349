//! Built-in scenario catalog for the sample shop.
//!
//! Two areas: the login form and the product/checkout flow. The checkout
//! area is split into two suites because the customer-information group
//! replays a longer setup (the checkout modal is opened before each case).

use crate::assertion::{path_of, Matcher};
use crate::config::{AuthContract, SuiteConfig};
use crate::scenario::{Scenario, Step, Suite};
use crate::selector::{AttributeSelector, Selector};

/// Rejection alert raised by the login form
pub const INVALID_LOGIN: &str = "Invalid login";

/// In-page rejection text the long-input case looks for
pub const INVALID_CREDENTIALS_TEXT: &str = "Invalid username or password";

const UNCONFIRMED: &str = "authentication contract unconfirmed";

/// Alert raised and still on the login page
fn rejected(home: &str) -> [Step; 2] {
    [
        Step::assert_page(Matcher::dialog_shown(INVALID_LOGIN)),
        Step::assert_page(Matcher::url_path(home)),
    ]
}

fn accepted() -> Step {
    Step::assert_page(Matcher::url_contains("/items"))
}

/// Scenario whose outcome depends on an unconfirmed part of the auth contract
fn contract_case(
    id: &str,
    title: &str,
    home: &str,
    login: Step,
    accepts: Option<bool>,
) -> Scenario {
    let scenario = Scenario::new(id, title).step(login);
    match accepts {
        Some(true) => scenario.step(accepted()),
        Some(false) => scenario.steps(rejected(home)),
        None => scenario.skip(UNCONFIRMED),
    }
}

/// Login form scenarios
#[must_use]
pub fn login_suite(config: &SuiteConfig) -> Suite {
    let AuthContract {
        username_case_sensitive,
        trims_whitespace,
    } = config.auth_contract;
    let home = path_of(&config.url("/")).to_string();

    Suite::new("login")
        .with_before_each([Step::GotoSite])
        .with_scenario(
            Scenario::new("TC001", "login succeeds with valid credentials")
                .step(Step::login("alain", "alain1234"))
                .step(accepted())
                .step(Step::assert(
                    Selector::text("Select Your Items"),
                    Matcher::Visible,
                )),
        )
        .with_scenario(
            Scenario::new("TC002", "login fails with an unknown username")
                .step(Step::login("invaliduser", "alain1234"))
                .steps(rejected(&home)),
        )
        .with_scenario(
            Scenario::new("TC003", "login fails with a wrong password")
                .step(Step::login("alain", "wrongpassword"))
                .steps(rejected(&home)),
        )
        .with_scenario(
            Scenario::new("TC004", "login fails with an empty username")
                .step(Step::login("", "alain1234"))
                .steps(rejected(&home)),
        )
        .with_scenario(
            Scenario::new("TC005", "login fails with an empty password")
                .step(Step::login("alain", ""))
                .steps(rejected(&home)),
        )
        .with_scenario(
            Scenario::new("TC005B", "login fails with both fields empty")
                .step(Step::login("", ""))
                .steps(rejected(&home)),
        )
        .with_scenario(
            Scenario::new("TC006", "login fails with an uppercased password")
                .step(Step::login("alain", "ALAIN1234"))
                .steps(rejected(&home))
                .expect_failure("password comparison ignores case"),
        )
        .with_scenario(contract_case(
            "TC007",
            "uppercased username follows the case-sensitivity contract",
            &home,
            Step::login("ALAIN", "alain1234"),
            username_case_sensitive.map(|sensitive| !sensitive),
        ))
        .with_scenario(contract_case(
            "TC008",
            "surrounding spaces follow the trimming contract",
            &home,
            Step::login(" alain ", " alain1234 "),
            trims_whitespace,
        ))
        .with_scenario(
            Scenario::new("TC009", "login succeeds with a special-character password")
                .step(Step::login("alain", "alain@1234#"))
                .step(accepted())
                .expect_failure("the shop has no account with password alain@1234#"),
        )
        .with_scenario(
            Scenario::new("TC010", "500-character credentials are rejected gracefully")
                .step(Step::login("a".repeat(500), "b".repeat(500)))
                .steps(rejected(&home))
                .step(Step::assert(
                    Selector::text(INVALID_CREDENTIALS_TEXT),
                    Matcher::Visible,
                ))
                .expect_failure("rejection is reported by an alert, not by page text"),
        )
}

fn item(name: &str) -> Selector {
    AttributeSelector::class("item").attr("data-name", name).into()
}

fn quantity(name: &str) -> Selector {
    Selector::class("quantity-input").within(item(name))
}

fn submit_button() -> Selector {
    Selector::class("submit-btn")
}

fn modal() -> Selector {
    Selector::class("modal-content")
}

fn modal_heading() -> Selector {
    modal().then(Selector::tag("h3"))
}

fn customer_name() -> Selector {
    Selector::id("customerName")
}

fn customer_phone() -> Selector {
    Selector::id("customerPhone")
}

fn customer_address() -> Selector {
    Selector::id("customerAddress")
}

const ADDRESS: &str = "123 Main St, City, State 12345";

/// Select size 42, order two pairs of shoes and open the checkout modal
fn open_checkout() -> Vec<Step> {
    vec![
        Step::check(Selector::checkbox("Shoe")),
        Step::select(Selector::label("Size Shoe:").within(item("Shoe")), "42"),
        Step::clear(quantity("Shoe")),
        Step::type_text(quantity("Shoe"), "2"),
        Step::click(submit_button()),
        Step::assert(modal(), Matcher::Visible),
        Step::assert(modal_heading(), Matcher::text_contains("Customer Details")),
    ]
}

/// Fill valid details, proceed and accept the confirmation
fn confirm_order() -> Vec<Step> {
    vec![
        Step::type_text(customer_name(), "John Doe"),
        Step::type_text(customer_phone(), "1234567890"),
        Step::type_text(customer_address(), ADDRESS),
        Step::click(Selector::id("proceedBtn")),
        Step::assert_within(Selector::id("confirmYes"), Matcher::Visible, 3_000),
        Step::click(Selector::id("confirmYes")),
        Step::assert_page(Matcher::url_contains("/summary")),
    ]
}

/// Open the site, log in with the configured account and land on `/items`
fn checkout_setup(config: &SuiteConfig) -> Vec<Step> {
    vec![
        Step::GotoSite,
        Step::login(&config.credentials.username, &config.credentials.password),
        accepted(),
    ]
}

/// Product selection and checkout initiation
#[must_use]
pub fn checkout_suite(config: &SuiteConfig) -> Suite {
    let shoe_size = Selector::label("Size Shoe:");
    let watch = Selector::checkbox("Jam Tangan");

    Suite::new("checkout")
        .with_before_each(checkout_setup(config))
        .with_scenario(
            Scenario::new("TC101", "product controls are displayed")
                .step(Step::assert(Selector::class("size-selector"), Matcher::Visible))
                .step(Step::assert(Selector::class("quantity-input"), Matcher::Visible))
                .step(Step::assert(submit_button(), Matcher::Visible)),
        )
        .with_scenario(
            Scenario::new("TC102", "size and variant dropdowns offer every option")
                .step(Step::assert(
                    Selector::label("Size Shirt:"),
                    Matcher::options_include(["S", "M", "L", "XL"]),
                ))
                .step(Step::assert(
                    shoe_size.clone(),
                    Matcher::options_include(["38", "39", "40", "41", "42", "43", "44", "45"]),
                ))
                .step(Step::assert(
                    Selector::label("Type"),
                    Matcher::options_include(["Snapback", "Bucket", "Beanie"]),
                ))
                .step(Step::assert(
                    Selector::label("Scent"),
                    Matcher::options_include(["Floral", "Woody", "Citrus"]),
                ))
                .step(Step::assert(
                    Selector::label("Color"),
                    Matcher::options_include(["Hitam", "Silver", "Coklat"]),
                )),
        )
        .with_scenario(
            Scenario::new("TC103", "shoe size can be changed")
                .step(Step::select(shoe_size.clone(), "42"))
                .step(Step::assert(shoe_size.clone(), Matcher::has_value("42")))
                .step(Step::select(shoe_size.clone(), "39"))
                .step(Step::assert(shoe_size.clone(), Matcher::has_value("39"))),
        )
        .with_scenario(
            Scenario::new("TC104", "selected shirt size is shown")
                .step(Step::select(Selector::label("Size Shirt:"), "L"))
                .step(Step::assert(Selector::label("Size Shirt:"), Matcher::has_value("L"))),
        )
        .with_scenario(
            Scenario::new("TC105", "default quantity is 1").step(Step::assert(
                Selector::class("quantity-input"),
                Matcher::has_value("1"),
            )),
        )
        .with_scenario(
            Scenario::new("TC106", "quantity accepts positive integers")
                .step(Step::clear(quantity("Shoe")))
                .step(Step::type_text(quantity("Shoe"), "3"))
                .step(Step::assert(quantity("Shoe"), Matcher::has_value("3")))
                .step(Step::clear(quantity("Cap")))
                .step(Step::type_text(quantity("Cap"), "10"))
                .step(Step::assert(quantity("Cap"), Matcher::has_value("10"))),
        )
        .with_scenario(
            Scenario::new("TC107", "quantity has a minimum of 1").step(Step::assert(
                quantity("Shoe"),
                Matcher::has_attribute("min", "1"),
            )),
        )
        .with_scenario(
            Scenario::new("TC108", "zero quantity reports a range error")
                .step(Step::clear(quantity("Shoe")))
                .step(Step::type_text(quantity("Shoe"), "0"))
                .step(Step::blur(quantity("Shoe")))
                .step(Step::click(submit_button()))
                .step(Step::assert(
                    quantity("Shoe"),
                    Matcher::validation_message("Value must be greater than or equal to 1."),
                )),
        )
        .with_scenario(
            Scenario::new("TC109", "product selection checkbox is displayed")
                .step(Step::assert(watch.clone(), Matcher::Visible)),
        )
        .with_scenario(
            Scenario::new("TC110", "checkbox toggles")
                .step(Step::assert(watch.clone(), Matcher::NotChecked))
                .step(Step::check(watch.clone()))
                .step(Step::assert(watch.clone(), Matcher::Checked))
                .step(Step::uncheck(watch.clone()))
                .step(Step::assert(watch.clone(), Matcher::NotChecked)),
        )
        .with_scenario(
            Scenario::new("TC111", "checkout button is displayed")
                .step(Step::assert(submit_button(), Matcher::Visible))
                .step(Step::assert(
                    submit_button(),
                    Matcher::text_contains("Proceed to Checkout"),
                )),
        )
        .with_scenario(
            Scenario::new("TC112", "checkout button is enabled after a selection")
                .step(Step::check(watch.clone()))
                .step(Step::assert(submit_button(), Matcher::Enabled)),
        )
        .with_scenario(
            Scenario::new("TC113", "checkout opens the customer popup").steps(open_checkout()),
        )
        .with_scenario(
            Scenario::new("TC114", "popup shows the customer details heading")
                .steps(open_checkout()),
        )
        .with_scenario(
            Scenario::new("TC115", "popup contains every customer field")
                .steps(open_checkout())
                .steps([
                    Step::assert(customer_name(), Matcher::Visible),
                    Step::assert(customer_phone(), Matcher::Visible),
                    Step::assert(customer_address(), Matcher::Visible),
                    Step::assert(
                        customer_name(),
                        Matcher::has_attribute("placeholder", "Enter your name"),
                    ),
                    Step::assert(
                        customer_phone(),
                        Matcher::has_attribute("placeholder", "Enter your phone number"),
                    ),
                    Step::assert(
                        customer_address(),
                        Matcher::has_attribute("placeholder", "Enter your full address"),
                    ),
                ]),
        )
        .with_scenario(
            Scenario::new("TC116", "popup shows proceed and cancel")
                .steps(open_checkout())
                .steps([
                    Step::assert(Selector::id("proceedBtn"), Matcher::Visible),
                    Step::assert(Selector::id("proceedBtn"), Matcher::text_contains("Proceed")),
                    Step::assert(Selector::id("cancelBtn"), Matcher::Visible),
                    Step::assert(Selector::id("cancelBtn"), Matcher::text_contains("Cancel")),
                ]),
        )
        .with_scenario(
            Scenario::new("TC125", "complete purchase flow")
                .step(Step::select(shoe_size.within(item("Shoe")), "42"))
                .step(Step::clear(quantity("Shoe")))
                .step(Step::type_text(quantity("Shoe"), "2"))
                .step(Step::check(Selector::checkbox("Shoe")))
                .step(Step::click(submit_button()))
                .steps(confirm_order()),
        )
        .with_scenario(
            Scenario::new("TC126", "checkout without a selection is refused")
                .step(Step::click(submit_button()))
                .step(Step::assert(modal(), Matcher::Visible))
                .step(Step::assert(
                    modal(),
                    Matcher::text_contains("Please select at least one item."),
                )),
        )
        .with_scenario(
            Scenario::new("TC127", "negative quantity is invalid")
                .step(Step::check(Selector::checkbox("Shoe")))
                .step(Step::clear(quantity("Shoe")))
                .step(Step::type_text(quantity("Shoe"), "-1"))
                .step(Step::assert(quantity("Shoe"), Matcher::Invalid)),
        )
        .with_scenario(
            Scenario::new("TC128", "empty quantity is invalid")
                .step(Step::check(Selector::checkbox("Shoe")))
                .step(Step::clear(quantity("Shoe")))
                .step(Step::assert(quantity("Shoe"), Matcher::Invalid)),
        )
        .with_scenario(
            Scenario::new("TC129", "non-numeric quantity is discarded")
                .step(Step::clear(quantity("Shoe")))
                .step(Step::type_text(quantity("Shoe"), "abc"))
                .step(Step::assert(quantity("Shoe"), Matcher::has_value(""))),
        )
        .with_scenario(
            Scenario::new("TC130", "reopened popup starts empty")
                .step(Step::check(Selector::checkbox("Shoe")))
                .step(Step::click(submit_button()))
                .step(Step::type_text(customer_name(), "John"))
                .step(Step::type_text(customer_phone(), "123"))
                .step(Step::click(Selector::id("cancelBtn")))
                .step(Step::click(submit_button()))
                .step(Step::assert(customer_name(), Matcher::has_value(""))),
        )
        .with_scenario(
            Scenario::new("TC131", "address accepts 500 characters")
                .step(Step::check(Selector::checkbox("Cap")))
                .step(Step::click(submit_button()))
                .step(Step::type_text(customer_address(), "A".repeat(500)))
                .step(Step::assert(
                    customer_address(),
                    Matcher::contains_value("A".repeat(500)),
                )),
        )
        .with_scenario(
            Scenario::new("TC132", "phone and address accept special characters")
                .step(Step::check(Selector::checkbox("Perfume")))
                .step(Step::click(submit_button()))
                .step(Step::type_text(customer_phone(), "(123) 456-7890"))
                .step(Step::type_text(customer_address(), "123 Main St. #4B, City & State"))
                .step(Step::assert(
                    customer_phone(),
                    Matcher::contains_value("(123) 456-7890"),
                ))
                .step(Step::assert(
                    customer_address(),
                    Matcher::contains_value("123 Main St. #4B, City & State"),
                )),
        )
        .with_scenario(
            Scenario::new("TC133", "customer fields are labelled")
                .step(Step::check(Selector::checkbox("Shoe")))
                .step(Step::click(submit_button()))
                .steps(["customerName", "customerPhone", "customerAddress"].map(|field| {
                    Step::assert(field_label(field), Matcher::Exists)
                }))
                .steps(["customerPhone", "customerAddress"].map(|field| {
                    Step::assert(
                        field_label(field).then(Selector::class("required")),
                        Matcher::Exists,
                    )
                })),
        )
}

fn field_label(field: &str) -> Selector {
    AttributeSelector::tag("label").attr("for", field).into()
}

/// Customer information form inside the checkout modal
#[must_use]
pub fn customer_info_suite(config: &SuiteConfig) -> Suite {
    let mut setup = checkout_setup(config);
    setup.extend(open_checkout());

    Suite::new("customer-info")
        .with_before_each(setup)
        .with_scenario(
            Scenario::new("TC117", "phone and address are required")
                .step(Step::assert(customer_phone(), Matcher::has_attribute_present("required")))
                .step(Step::assert(
                    customer_address(),
                    Matcher::has_attribute_present("required"),
                )),
        )
        .with_scenario(
            Scenario::new("TC118", "empty phone fails validation")
                .step(Step::click(Selector::id("proceedBtn")))
                .step(Step::assert(customer_phone(), Matcher::Invalid)),
        )
        .with_scenario(
            Scenario::new("TC119", "alphabetic phone is reported")
                .step(Step::click(Selector::id("proceedBtn")))
                .step(Step::clear(customer_phone()))
                .step(Step::type_text(customer_phone(), "abcdef"))
                .step(Step::type_text(customer_address(), ADDRESS))
                .step(Step::click(Selector::id("proceedBtn")))
                .step(Step::assert(
                    Selector::text("Please enter a valid phone number"),
                    Matcher::Exists,
                )),
        )
        .with_scenario(
            Scenario::new("TC120", "valid details lead to the summary")
                .steps(confirm_order())
                .steps(
                    ["summary-content", "items-section", "total-section", "action-buttons"]
                        .map(|class| Step::assert(Selector::class(class), Matcher::Exists)),
                )
                .step(Step::assert(Selector::id("customerDetails"), Matcher::Exists)),
        )
        .with_scenario(
            Scenario::new("TC121", "summary repeats the customer details")
                .step(Step::type_text(customer_name(), "John Doe"))
                .step(Step::assert(customer_name(), Matcher::has_value("John Doe")))
                .step(Step::type_text(customer_phone(), "1234567890"))
                .step(Step::assert(customer_phone(), Matcher::has_value("1234567890")))
                .step(Step::type_text(
                    customer_address(),
                    "123 Main Street\nAnytown, State 12345",
                ))
                .step(Step::assert(
                    customer_address(),
                    Matcher::contains_value("123 Main Street"),
                ))
                .step(Step::click(Selector::id("proceedBtn")))
                .step(Step::assert_within(Selector::id("confirmYes"), Matcher::Visible, 3_000))
                .step(Step::click(Selector::id("confirmYes")))
                .step(Step::assert_page(Matcher::url_contains("/summary")))
                .steps(["John Doe", "1234567890", "123 Main Street"].map(|text| {
                    Step::assert(Selector::id("customerDetails"), Matcher::text_contains(text))
                })),
        )
        .with_scenario(
            Scenario::new("TC122", "address accepts several lines")
                .step(Step::type_text(
                    customer_address(),
                    "123 Main Street\nApartment 4B\nAnytown, State 12345",
                ))
                .step(Step::assert(
                    customer_address(),
                    Matcher::contains_value("Apartment 4B"),
                )),
        )
        .with_scenario(
            Scenario::new("TC123", "cancel closes the popup")
                .step(Step::click(Selector::id("cancelBtn")))
                .step(Step::assert(modal(), Matcher::NotVisible)),
        )
        .with_scenario(
            Scenario::new("TC124", "cancel returns to the product page")
                .step(Step::click(Selector::id("cancelBtn")))
                .step(Step::assert(
                    AttributeSelector::default().attr("data-price", "60"),
                    Matcher::Visible,
                ))
                .step(Step::assert(submit_button(), Matcher::Visible)),
        )
}

/// Every built-in suite in run order
#[must_use]
pub fn all_suites(config: &SuiteConfig) -> Vec<Suite> {
    vec![
        login_suite(config),
        checkout_suite(config),
        customer_info_suite(config),
    ]
}

/// Built-in suite by name (`login`, `checkout`, `customer-info`)
#[must_use]
pub fn suite_by_name(name: &str, config: &SuiteConfig) -> Option<Suite> {
    all_suites(config).into_iter().find(|suite| suite.name == name)
}
