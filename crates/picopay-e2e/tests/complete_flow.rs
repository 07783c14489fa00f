//! Complete signature-scheme channel flow across both services.

use picopay_e2e::{ClientActor, TestNet, INITIAL_BALANCE};

#[tokio::test]
async fn complete_payment_flow_all_actors_succeed() {
    let net = TestNet::new();
    let client = ClientActor::new();

    // Phase 1a: register client and vendor
    let client_initial = net.register(client.public_key_der_b64()).await;
    let vendor_initial = net.register(net.vendor_public_key()).await;
    assert!(client_initial > 0);

    // Phase 1b: open the channel; funds are locked immediately
    let channel_amount = 1000;
    let open = client.open_signature_channel(net.vendor_public_key(), channel_amount);
    let channel = net.channels.open_channel(&open).await.unwrap();
    assert_eq!(channel.amount, channel_amount);
    assert_eq!(channel.balance, 0);
    assert_eq!(
        channel.client_public_key_der_b64,
        client.public_key_der_b64()
    );
    assert_eq!(channel.vendor_public_key_der_b64, net.vendor_public_key());

    assert_eq!(
        net.balance(client.public_key_der_b64()).await,
        client_initial - channel_amount
    );
    assert_eq!(net.balance(net.vendor_public_key()).await, vendor_initial);

    // Phase 2: cumulative payments 50, 100, 200, 350
    for owed in [50, 100, 200, 350] {
        let accepted = net
            .payments
            .receive_payment(
                &channel.channel_id,
                &client.signature_payment(&channel.channel_id, owed),
            )
            .await
            .unwrap();
        assert_eq!(accepted.cumulative_owed_amount, owed);
    }

    // Phase 3: vendor settles; vendor +350, client refunded 650
    net.settlement
        .request_settlement(&channel.channel_id)
        .await
        .unwrap();

    assert_eq!(
        net.balance(client.public_key_der_b64()).await,
        client_initial - 350
    );
    assert_eq!(
        net.balance(net.vendor_public_key()).await,
        vendor_initial + 350
    );

    let settled = net.channels.get_channel(&channel.channel_id).await.unwrap();
    assert!(settled.is_closed);
    assert_eq!(settled.balance, 350);
    assert_eq!(settled.amount, channel_amount);
}

#[tokio::test]
async fn registration_is_idempotent_end_to_end() {
    let net = TestNet::new();
    let client = ClientActor::new();

    let first = net.register(client.public_key_der_b64()).await;
    let second = net.register(client.public_key_der_b64()).await;

    assert_eq!(first, INITIAL_BALANCE);
    assert_eq!(first, second);
}

#[tokio::test]
async fn locked_funds_stay_locked_until_settlement() {
    let net = TestNet::new();
    let client = ClientActor::new();
    net.register(client.public_key_der_b64()).await;
    net.register(net.vendor_public_key()).await;

    let open = client.open_signature_channel(net.vendor_public_key(), 400);
    let channel = net.channels.open_channel(&open).await.unwrap();

    // payments do not move ledger balances
    net.payments
        .receive_payment(
            &channel.channel_id,
            &client.signature_payment(&channel.channel_id, 100),
        )
        .await
        .unwrap();

    assert_eq!(
        net.balance(client.public_key_der_b64()).await,
        INITIAL_BALANCE - 400
    );
    assert_eq!(net.balance(net.vendor_public_key()).await, INITIAL_BALANCE);
}
