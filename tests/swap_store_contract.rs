mod support;

use anyhow::{Context as _, Result};
use bitcoin::Network;
use btc_swap_core::chain::ChainParams;
use btc_swap_core::swap::{
    MemorySwapStore, Preimage, SqliteSwapStore, SwapStatus, SwapStore, create_reverse_swap_checked,
    create_swap_checked,
};
use btc_swap_core::{Error, RecordKind};

use support::fixtures::{
    LOCKUP_ADDRESS, NESTED_LOCKUP_ADDRESS, sample_reverse_swap, sample_swap,
};

fn ids<T>(records: &[T], id: impl Fn(&T) -> &str) -> Vec<String> {
    records.iter().map(|r| id(r).to_string()).collect()
}

fn create_and_get<S: SwapStore + ?Sized>(store: &mut S) -> Result<()> {
    let mut a = sample_swap("swap-a", SwapStatus::Created, 800_000);
    a.invoice = None;
    store.create_swap(&a).context("create swap-a")?;

    let mut b = sample_swap("swap-b", SwapStatus::InvoiceSet, 800_000);
    b.preimage = Some(Preimage::new(vec![0x11; 32]));
    b.lockup_transaction_id = Some("lockup-b".to_string());
    store.create_swap(&b).context("create swap-b")?;

    assert_eq!(store.get_swap("swap-a")?, a);
    assert_eq!(store.get_swap("swap-b")?, b);

    let listed = store.list_swaps()?;
    assert_eq!(ids(&listed, |s| s.id.as_str()), ["swap-a", "swap-b"]);

    let err = store.get_swap("missing").unwrap_err();
    assert!(err.is_not_found(), "{err}");
    assert!(err.to_string().contains("swap not found"));
    Ok(())
}

fn duplicate_and_constraints<S: SwapStore + ?Sized>(store: &mut S) -> Result<()> {
    let original = sample_swap("swap-dup", SwapStatus::Created, 800_000);
    store.create_swap(&original)?;

    let mut clash = sample_swap("swap-dup", SwapStatus::TransactionMempool, 1);
    clash.address = "bc1qsomethingelse".to_string();
    let err = store.create_swap(&clash).unwrap_err();
    assert!(
        matches!(
            &err,
            Error::DuplicateId {
                kind: RecordKind::Swap,
                id
            } if id == "swap-dup"
        ),
        "{err}"
    );
    assert_eq!(store.get_swap("swap-dup")?, original);

    let no_id = sample_swap("", SwapStatus::Created, 1);
    let err = store.create_swap(&no_id).unwrap_err();
    assert!(matches!(err, Error::ConstraintViolation(_)), "{err}");

    let mut no_script = sample_swap("swap-no-script", SwapStatus::Created, 1);
    no_script.redeem_script = bitcoin::ScriptBuf::new();
    let err = store.create_swap(&no_script).unwrap_err();
    assert!(matches!(err, Error::ConstraintViolation(_)), "{err}");
    assert!(store.get_swap("swap-no-script").unwrap_err().is_not_found());

    let mut empty_preimage = sample_swap("swap-empty-preimage", SwapStatus::InvoicePaid, 1);
    empty_preimage.preimage = Some(Preimage::new(Vec::new()));
    let err = store.create_swap(&empty_preimage).unwrap_err();
    assert!(matches!(err, Error::ConstraintViolation(_)), "{err}");
    assert!(
        store
            .get_swap("swap-empty-preimage")
            .unwrap_err()
            .is_not_found()
    );

    let mut no_preimage = sample_reverse_swap("reverse-no-preimage", SwapStatus::Created);
    no_preimage.preimage = Preimage::new(Vec::new());
    let err = store.create_reverse_swap(&no_preimage).unwrap_err();
    assert!(matches!(err, Error::ConstraintViolation(_)), "{err}");

    let reverse = sample_reverse_swap("reverse-dup", SwapStatus::Created);
    store.create_reverse_swap(&reverse)?;
    let err = store.create_reverse_swap(&reverse).unwrap_err();
    assert!(
        matches!(
            err,
            Error::DuplicateId {
                kind: RecordKind::ReverseSwap,
                ..
            }
        ),
        "{err}"
    );
    Ok(())
}

fn pending_and_refundable<S: SwapStore + ?Sized>(store: &mut S) -> Result<()> {
    let height = 800_000;
    store.create_swap(&sample_swap("early", SwapStatus::TransactionConfirmed, height - 10))?;
    store.create_swap(&sample_swap("at-height", SwapStatus::InvoiceFailedToPay, height))?;
    store.create_swap(&sample_swap("late", SwapStatus::Created, height + 10))?;
    store.create_swap(&sample_swap("claimed", SwapStatus::TransactionClaimed, height - 10))?;
    store.create_swap(&sample_swap(
        "from-newer-build",
        SwapStatus::Unknown("transaction.server.mempool".to_string()),
        height - 10,
    ))?;

    let pending = store.list_pending_swaps()?;
    assert_eq!(
        ids(&pending, |s| s.id.as_str()),
        ["early", "at-height", "late", "from-newer-build"]
    );

    let refundable = store.list_refundable_swaps(height - 1)?;
    assert_eq!(ids(&refundable, |s| s.id.as_str()), ["early", "from-newer-build"]);

    let refundable = store.list_refundable_swaps(height)?;
    assert_eq!(
        ids(&refundable, |s| s.id.as_str()),
        ["early", "at-height", "from-newer-build"]
    );

    let refundable = store.list_refundable_swaps(height + 1)?;
    assert_eq!(
        ids(&refundable, |s| s.id.as_str()),
        ["early", "at-height", "from-newer-build"]
    );

    // polling has no side effects
    assert_eq!(store.list_refundable_swaps(height)?, refundable);

    store.set_swap_refund_transaction_id("at-height", "refund-tx")?;
    let refundable = store.list_refundable_swaps(height + 1)?;
    assert_eq!(ids(&refundable, |s| s.id.as_str()), ["early", "from-newer-build"]);

    store.update_swap_status("early", &SwapStatus::Abandoned)?;
    let refundable = store.list_refundable_swaps(u32::MAX)?;
    assert_eq!(ids(&refundable, |s| s.id.as_str()), ["late", "from-newer-build"]);

    // reverse swaps are never refundable by us, and have their own pending list
    store.create_reverse_swap(&sample_reverse_swap("rev-open", SwapStatus::TransactionMempool))?;
    store.create_reverse_swap(&sample_reverse_swap("rev-done", SwapStatus::InvoiceSettled))?;
    let pending = store.list_pending_reverse_swaps()?;
    assert_eq!(ids(&pending, |s| s.id.as_str()), ["rev-open"]);
    assert!(
        store
            .list_refundable_swaps(u32::MAX)?
            .iter()
            .all(|s| !s.id.starts_with("rev-"))
    );
    Ok(())
}

fn targeted_updates<S: SwapStore + ?Sized>(store: &mut S) -> Result<()> {
    let mut expected = sample_swap("swap-u", SwapStatus::Created, 800_000);
    expected.invoice = None;
    store.create_swap(&expected)?;

    store.update_swap_status("swap-u", &SwapStatus::TransactionMempool)?;
    expected.status = SwapStatus::TransactionMempool;
    assert_eq!(store.get_swap("swap-u")?, expected);

    store.set_swap_invoice("swap-u", "lnbc1late")?;
    expected.invoice = Some("lnbc1late".to_string());
    assert_eq!(store.get_swap("swap-u")?, expected);

    store.set_swap_lockup_transaction_id("swap-u", "lockup-u")?;
    expected.lockup_transaction_id = Some("lockup-u".to_string());
    assert_eq!(store.get_swap("swap-u")?, expected);

    store.set_swap_refund_transaction_id("swap-u", "refund-u")?;
    expected.refund_transaction_id = Some("refund-u".to_string());
    expected.status = SwapStatus::Refunded;
    let got = store.get_swap("swap-u")?;
    assert_eq!(got, expected);
    assert_eq!(got.status, SwapStatus::Refunded);
    assert_eq!(got.refund_transaction_id.as_deref(), Some("refund-u"));

    let mut expected = sample_reverse_swap("reverse-u", SwapStatus::Created);
    store.create_reverse_swap(&expected)?;

    store.update_reverse_swap_status("reverse-u", &SwapStatus::TransactionMempool)?;
    expected.status = SwapStatus::TransactionMempool;
    assert_eq!(store.get_reverse_swap("reverse-u")?, expected);

    store.set_reverse_swap_lockup_transaction_id("reverse-u", "lockup-r")?;
    expected.lockup_transaction_id = Some("lockup-r".to_string());
    assert_eq!(store.get_reverse_swap("reverse-u")?, expected);

    store.set_reverse_swap_claim_transaction_id("reverse-u", "claim-r")?;
    expected.claim_transaction_id = Some("claim-r".to_string());
    assert_eq!(store.get_reverse_swap("reverse-u")?, expected);
    assert_eq!(store.list_reverse_swaps()?, vec![expected]);

    // the swap with the same id in the other table is untouched
    assert!(store.get_swap("reverse-u").unwrap_err().is_not_found());
    Ok(())
}

fn updates_on_missing_ids<S: SwapStore + ?Sized>(store: &mut S) -> Result<()> {
    let results = [
        store.update_swap_status("missing", &SwapStatus::Expired),
        store.set_swap_invoice("missing", "lnbc1"),
        store.set_swap_lockup_transaction_id("missing", "tx"),
        store.set_swap_refund_transaction_id("missing", "tx"),
        store.update_reverse_swap_status("missing", &SwapStatus::Expired),
        store.set_reverse_swap_lockup_transaction_id("missing", "tx"),
        store.set_reverse_swap_claim_transaction_id("missing", "tx"),
    ];
    for result in results {
        let err = result.unwrap_err();
        assert!(err.is_not_found(), "{err}");
    }
    assert!(
        store
            .get_reverse_swap("missing")
            .unwrap_err()
            .is_not_found()
    );
    Ok(())
}

fn checked_creation<S: SwapStore + ?Sized>(store: &mut S) -> Result<()> {
    let params = ChainParams::from(Network::Bitcoin);

    let mut wrong = sample_swap("checked-wrong", SwapStatus::Created, 800_000);
    wrong.address = NESTED_LOCKUP_ADDRESS.to_string();
    let err = create_swap_checked(store, &params, &wrong).unwrap_err();
    assert!(matches!(err, Error::InvalidAddress(_)), "{err}");
    assert!(store.get_swap("checked-wrong").unwrap_err().is_not_found());

    let ok = sample_swap("checked-ok", SwapStatus::Created, 800_000);
    assert_eq!(ok.address, LOCKUP_ADDRESS);
    create_swap_checked(store, &params, &ok)?;
    assert_eq!(store.get_swap("checked-ok")?, ok);

    let reverse = sample_reverse_swap("checked-reverse", SwapStatus::Created);
    let err = create_reverse_swap_checked(store, &params, LOCKUP_ADDRESS, &reverse).unwrap_err();
    assert!(matches!(err, Error::InvalidAddress(_)), "{err}");
    let err = create_reverse_swap_checked(store, &params, "", &reverse).unwrap_err();
    assert!(matches!(err, Error::InvalidAddress(_)), "{err}");
    assert!(
        store
            .get_reverse_swap("checked-reverse")
            .unwrap_err()
            .is_not_found()
    );

    create_reverse_swap_checked(store, &params, NESTED_LOCKUP_ADDRESS, &reverse)?;
    assert_eq!(store.get_reverse_swap("checked-reverse")?, reverse);
    Ok(())
}

fn known_status_spelled_as_unknown<S: SwapStore + ?Sized>(store: &mut S) -> Result<()> {
    let refunded = SwapStatus::Unknown("swap.refunded".to_string());
    store.create_swap(&sample_swap("spelled-refunded", refunded.clone(), 100))?;
    store.create_swap(&sample_swap("spelled-pending", SwapStatus::Created, 100))?;
    store.update_swap_status(
        "spelled-pending",
        &SwapStatus::Unknown("transaction.confirmed".to_string()),
    )?;

    assert_eq!(
        store.get_swap("spelled-refunded")?.status,
        SwapStatus::Refunded
    );
    assert_eq!(
        store.get_swap("spelled-pending")?.status,
        SwapStatus::TransactionConfirmed
    );
    assert_eq!(
        ids(&store.list_pending_swaps()?, |s| s.id.as_str()),
        ["spelled-pending"]
    );
    assert_eq!(
        ids(&store.list_refundable_swaps(100)?, |s| s.id.as_str()),
        ["spelled-pending"]
    );

    store.create_reverse_swap(&sample_reverse_swap("spelled-reverse", SwapStatus::Created))?;
    store.update_reverse_swap_status("spelled-reverse", &refunded)?;
    assert_eq!(
        store.get_reverse_swap("spelled-reverse")?.status,
        SwapStatus::Refunded
    );
    assert!(store.list_pending_reverse_swaps()?.is_empty());
    Ok(())
}

fn run_contract(mut new_store: impl FnMut() -> Result<Box<dyn SwapStore>>) -> Result<()> {
    create_and_get(new_store()?.as_mut()).context("create_and_get")?;
    duplicate_and_constraints(new_store()?.as_mut()).context("duplicate_and_constraints")?;
    pending_and_refundable(new_store()?.as_mut()).context("pending_and_refundable")?;
    targeted_updates(new_store()?.as_mut()).context("targeted_updates")?;
    updates_on_missing_ids(new_store()?.as_mut()).context("updates_on_missing_ids")?;
    checked_creation(new_store()?.as_mut()).context("checked_creation")?;
    known_status_spelled_as_unknown(new_store()?.as_mut())
        .context("known_status_spelled_as_unknown")?;
    Ok(())
}

#[test]
fn sqlite_store_satisfies_contract() -> Result<()> {
    let dir = tempfile::tempdir().context("create tempdir")?;
    let mut n = 0;
    run_contract(|| {
        n += 1;
        let path = dir.path().join(format!("swaps-{n}.sqlite3"));
        let store = SqliteSwapStore::open(path).context("open sqlite store")?;
        Ok(Box::new(store) as Box<dyn SwapStore>)
    })
}

#[test]
fn memory_store_satisfies_contract() -> Result<()> {
    run_contract(|| Ok(Box::new(MemorySwapStore::new()) as Box<dyn SwapStore>))
}
