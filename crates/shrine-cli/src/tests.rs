use shrine_core::{Role, Session};

use super::*;

fn signed_in_state() -> LocalState {
    let state = LocalState::in_memory();
    state
        .save_session(&Session {
            token: "jwt-live".to_owned(),
            role: Role::User,
            user_id: Some("u-1".to_owned()),
            name: Some("Meera".to_owned()),
            email: None,
        })
        .unwrap();
    state
}

#[test]
fn parses_login_command() {
    let cli = Cli::try_parse_from([
        "shrine",
        "login",
        "--email",
        "meera@example.test",
        "--password",
        "pw",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Login { ref email, ref password })
            if email == "meera@example.test" && password == "pw"
    ));
}

#[test]
fn parses_cart_add_with_default_quantity() {
    let cli = Cli::try_parse_from(["shrine", "cart", "add", "p-1"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Cart {
            command: CartCommands::Add { ref product_id, quantity: 1 }
        }) if product_id == "p-1"
    ));
}

#[test]
fn parses_cart_add_with_quantity() {
    let cli = Cli::try_parse_from(["shrine", "cart", "add", "p-1", "-q", "3"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Cart {
            command: CartCommands::Add { quantity: 3, .. }
        })
    ));
}

#[test]
fn rejects_zero_quantity() {
    let result = Cli::try_parse_from(["shrine", "cart", "add", "p-1", "--quantity", "0"]);
    assert!(result.is_err());
}

#[test]
fn parses_products_list_with_category() {
    let cli = Cli::try_parse_from(["shrine", "products", "list", "--category", "Idols"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Products {
            command: ProductCommands::List { category: Some(ref c) }
        }) if c == "Idols"
    ));
}

#[test]
fn parses_wishlist_add() {
    let cli = Cli::try_parse_from(["shrine", "wishlist", "add", "w-1"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Wishlist {
            command: WishlistCommands::Add { ref product_id }
        }) if product_id == "w-1"
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["shrine"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn price_formats_two_decimals_in_rupees() {
    assert_eq!(display::price(rust_decimal::Decimal::new(4995, 1)), "₹499.50");
    assert_eq!(display::price(rust_decimal::Decimal::from(50)), "₹50.00");
}

#[test]
fn rejected_session_is_cleared_with_login_hint() {
    let state = signed_in_state();
    let err = recover_session(
        ClientError::Unauthorized {
            url: "https://shop.example.test/api/cart".to_owned(),
        }
        .into(),
        &state,
    );

    assert!(state.session().is_none());
    assert!(err.to_string().contains("run `shrine login`"));
}

#[test]
fn wrong_password_keeps_existing_session() {
    let state = signed_in_state();
    let err = recover_session(ClientError::InvalidCredentials.into(), &state);

    assert_eq!(state.token().as_deref(), Some("jwt-live"));
    assert_eq!(err.to_string(), "email or password was not accepted");
}

#[test]
fn other_errors_pass_through_untouched() {
    let state = signed_in_state();
    let err = recover_session(anyhow::anyhow!("disk full"), &state);

    assert!(state.session().is_some());
    assert_eq!(err.to_string(), "disk full");
}
