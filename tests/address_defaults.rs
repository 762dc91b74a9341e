mod common;

use wellness_store_api::{
    dto::{addresses::AddressRequest, payment_methods::PaymentMethodRequest},
    middleware::auth::AuthUser,
    services::{address_service, payment_method_service},
    state::AppState,
    status::PaymentMethod,
};

fn address(label: &str, is_default: bool) -> AddressRequest {
    AddressRequest {
        label: label.into(),
        full_name: "Asha Rao".into(),
        phone: "9876543210".into(),
        address_line: format!("{label} street"),
        city: "Pune".into(),
        state: "Maharashtra".into(),
        postal_code: "411001".into(),
        is_default,
    }
}

async fn defaults(state: &AppState, user: &AuthUser) -> anyhow::Result<Vec<String>> {
    let list = address_service::list_addresses(state, user).await?.data.unwrap();
    Ok(list
        .items
        .into_iter()
        .filter(|a| a.is_default)
        .map(|a| a.label)
        .collect())
}

#[tokio::test]
async fn exactly_one_default_address_survives_every_change() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, false).await?;

    let home = address_service::create_address(&state, &user, address("Home", false))
        .await?
        .data
        .unwrap();
    assert!(home.is_default, "first address becomes the default");

    let office = address_service::create_address(&state, &user, address("Office", true))
        .await?
        .data
        .unwrap();
    assert_eq!(defaults(&state, &user).await?, ["Office"]);

    address_service::set_default_address(&state, &user, home.id).await?;
    assert_eq!(defaults(&state, &user).await?, ["Home"]);

    address_service::delete_address(&state, &user, home.id).await?;
    assert_eq!(defaults(&state, &user).await?, ["Office"]);

    // Another customer cannot touch it.
    let stranger = common::create_user(&state, false).await?;
    let result = address_service::set_default_address(&state, &stranger, office.id).await;
    assert!(result.is_err());

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_addresses_yield_one_default() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    for _ in 0..10 {
        let user = common::create_user(&state, false).await?;
        let mut handles = Vec::new();
        for n in 0..4 {
            let state = state.clone();
            let user = user.clone();
            handles.push(tokio::spawn(async move {
                address_service::create_address(&state, &user, address(&format!("Flat {n}"), false))
                    .await
            }));
        }
        for handle in handles {
            handle.await??;
        }

        let list = address_service::list_addresses(&state, &user).await?.data.unwrap();
        assert_eq!(list.items.len(), 4);
        assert_eq!(defaults(&state, &user).await?.len(), 1);
    }

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_payment_methods_yield_one_default() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    for _ in 0..10 {
        let user = common::create_user(&state, false).await?;
        let mut handles = Vec::new();
        for n in 0..4 {
            let state = state.clone();
            let user = user.clone();
            handles.push(tokio::spawn(async move {
                payment_method_service::create_method(
                    &state,
                    &user,
                    PaymentMethodRequest {
                        kind: PaymentMethod::Upi,
                        label: format!("UPI {n}"),
                        last_four: None,
                        is_default: false,
                    },
                )
                .await
            }));
        }
        for handle in handles {
            handle.await??;
        }

        let methods = payment_method_service::list_methods(&state, &user)
            .await?
            .data
            .unwrap();
        assert_eq!(methods.items.len(), 4);
        assert_eq!(methods.items.iter().filter(|m| m.is_default).count(), 1);
    }

    Ok(())
}
