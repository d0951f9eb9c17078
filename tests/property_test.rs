use gophermart::domain::money::Amount;
use gophermart::domain::order::OrderStatus;
use proptest::prelude::*;
use rust_decimal::Decimal;

fn arb_status() -> impl Strategy<Value = OrderStatus> {
    prop_oneof![
        Just(OrderStatus::New),
        Just(OrderStatus::Processing),
        Just(OrderStatus::Invalid),
        Just(OrderStatus::Processed),
    ]
}

fn arb_amount() -> impl Strategy<Value = Amount> {
    (0i64..=1_000_000_000i64).prop_map(|cents| Amount::new(Decimal::new(cents, 2)).unwrap())
}

proptest! {
    /// INVALID and PROCESSED are final — is_final must hold for exactly those two.
    #[test]
    fn only_invalid_and_processed_are_final(status in arb_status()) {
        let expect_final = matches!(status, OrderStatus::Invalid | OrderStatus::Processed);
        prop_assert_eq!(status.is_final(), expect_final);
    }

    /// Amount::new never produces a negative value for any non-negative input.
    #[test]
    fn amount_is_never_negative(cents in 0i64..=1_000_000_000i64) {
        let amount = Amount::new(Decimal::new(cents, 2)).unwrap();
        prop_assert!(!amount.as_decimal().is_sign_negative() || amount.is_zero());
    }

    /// Amount::new rejects any strictly negative decimal.
    #[test]
    fn amount_rejects_negative(cents in 1i64..=1_000_000_000i64) {
        prop_assert!(Amount::new(Decimal::new(-cents, 2)).is_err());
    }

    /// checked_add matches plain decimal addition for any two amounts.
    #[test]
    fn checked_add_matches_decimal_add(a in arb_amount(), b in arb_amount()) {
        let sum = a.checked_add(b).unwrap();
        prop_assert_eq!(sum.as_decimal(), (a.as_decimal() + b.as_decimal()).round_dp(2));
    }

    /// checked_sub returns None whenever the result would go negative, and
    /// Some(a - b) otherwise.
    #[test]
    fn checked_sub_rejects_exactly_when_result_would_be_negative(a in arb_amount(), b in arb_amount()) {
        match a.checked_sub(b) {
            Some(diff) => {
                prop_assert!(a.as_decimal() >= b.as_decimal());
                prop_assert_eq!(diff.as_decimal(), (a.as_decimal() - b.as_decimal()).round_dp(2));
            }
            None => prop_assert!(a.as_decimal() < b.as_decimal()),
        }
    }

    /// add then sub the same amount is the identity.
    #[test]
    fn add_then_sub_is_identity(a in arb_amount(), b in arb_amount()) {
        let sum = a.checked_add(b).unwrap();
        let back = sum.checked_sub(b).unwrap();
        prop_assert_eq!(back.as_decimal(), a.as_decimal());
    }
}
