mod common;

use serde_json::json;

use common::{block_json, coinbase_tx, spend_tx};
use xscanner_btc::analyzer::stats;
use xscanner_btc::block::units::{btc_to_sats, satoshi_to_btc};
use xscanner_btc::block::{Block, Script, Transaction, COINBASE_PREV_TXID, COINBASE_PREV_VOUT};
use xscanner_btc::coin::bitcoin::model::{BlockchainInfo, RawBlock, RawTransaction};
use xscanner_btc::coin::market::Price;
use xscanner_btc::types::AppError;

fn raw_tx(value: serde_json::Value) -> RawTransaction {
  serde_json::from_value(value).unwrap()
}

fn raw_block(value: serde_json::Value) -> RawBlock {
  serde_json::from_value(value).unwrap()
}

#[test]
fn coinbase_gets_sentinel_input_and_zero_fee() {
  let tx = Transaction::from_rpc(&raw_tx(coinbase_tx("cb", 6.25)), &[]).unwrap();

  assert!(tx.is_coinbase);
  assert_eq!(tx.fee(), 0);
  assert_eq!(tx.fee_rate(), None);

  let input = &tx.inputs[0];
  assert_eq!(input.prev_txid, COINBASE_PREV_TXID);
  assert_eq!(input.prev_txid.len(), 64);
  assert_eq!(input.prev_vout_index, COINBASE_PREV_VOUT);
  assert_eq!(input.value, 0);
  assert!(input.witness.is_empty());
  assert!(input.is_coinbase());
  assert_eq!(input.script_sig, Script::from_hex("03a0bb0d0400000000").unwrap());
  assert_eq!(tx.outputs[0].value, 625_000_000);
}

#[test]
fn coinbase_ignores_supplied_values() {
  let tx = Transaction::from_rpc(&raw_tx(coinbase_tx("cb", 3.125)), &[999]).unwrap();
  assert_eq!(tx.inputs[0].value, 0);
  assert_eq!(tx.fee(), 0);
}

#[test]
fn fee_and_fee_rate_follow_resolved_inputs() {
  let raw = raw_tx(spend_tx("t1", &[("prev", 0)], &[0.00099], 400));
  let tx = Transaction::from_rpc(&raw, &[100_000]).unwrap();

  assert!(!tx.is_coinbase);
  assert_eq!(tx.input_value(), 100_000);
  assert_eq!(tx.output_value(), 99_000);
  assert_eq!(tx.fee(), 1_000);
  assert_eq!(tx.vbytes(), 100.0);
  assert_eq!(tx.fee_rate(), Some(10.0));

  let input = &tx.inputs[0];
  assert_eq!(input.prev_txid, "prev");
  assert_eq!(input.prev_vout_index, 0);
  assert_eq!(input.sequence, 4294967293);
  assert_eq!(input.witness, vec![hex::decode("3044022001").unwrap(), vec![0x02, 0xab]]);
}

#[test]
fn unresolved_inputs_show_up_as_negative_fee() {
  let raw = raw_tx(spend_tx("t1", &[("a", 0), ("b", 1)], &[0.5], 800));
  // second value missing: defaults to 0, fee is not clamped
  let tx = Transaction::from_rpc(&raw, &[10_000_000]).unwrap();
  assert_eq!(tx.inputs[1].value, 0);
  assert_eq!(tx.fee(), 10_000_000 - 50_000_000);
  assert!(tx.fee_rate().unwrap() < 0.0);
}

#[test]
fn outputs_are_rounded_to_satoshis_and_indexed() {
  let raw = raw_tx(spend_tx("t1", &[("a", 0)], &[0.1, 0.00000001, 20999999.9769], 600));
  let tx = Transaction::from_rpc(&raw, &[0]).unwrap();

  let values: Vec<u64> = tx.outputs.iter().map(|o| o.value).collect();
  assert_eq!(values, vec![10_000_000, 1, 2_099_999_997_690_000]);
  let positions: Vec<u32> = tx.outputs.iter().map(|o| o.n).collect();
  assert_eq!(positions, vec![0, 1, 2]);
}

#[test]
fn invalid_script_hex_is_rejected() {
  let mut value = spend_tx("t1", &[("a", 0)], &[0.1], 400);
  value["vout"][0]["scriptPubKey"]["hex"] = json!("zz");
  let err = Transaction::from_rpc(&raw_tx(value), &[0]).unwrap_err();
  assert!(matches!(err, AppError::Block(_)));
}

#[test]
fn end_to_end_block_metrics() {
  let coinbase = coinbase_tx("cb", 6.25);
  let spend = spend_tx("t1", &[("prev", 0)], &[0.00099], 400);
  let raw = raw_block(block_json(840_000, 1_713_571_767, vec![coinbase.clone(), spend.clone()]));

  let txs = vec![
    Transaction::from_rpc(&raw_tx(coinbase), &[]).unwrap(),
    Transaction::from_rpc(&raw_tx(spend), &[btc_to_sats(0.001)]).unwrap(),
  ];
  let price = Price { usd: 63_000, sats_per_usd: 1_587 };
  let block = Block::new(&raw, price, txs).unwrap();

  assert_eq!(block.height, 840_000);
  assert_eq!(block.tx_count(), 2);
  assert_eq!(block.transactions[1].fee(), 1_000);
  assert_eq!(block.transactions[1].vbytes(), 100.0);
  assert_eq!(block.transactions[1].fee_rate(), Some(10.0));
  assert_eq!(block.total_fees(), 1_000);
  assert_eq!(block.total_value(), 625_000_000 + 99_000);
  assert_eq!(block.utxo_values(), vec![625_000_000, 99_000]);
  assert_eq!(block.mean_fee_rate(), Some(10.0));
  assert_eq!(block.median_fee_rate(), Some(10.0));
  assert_eq!(block.price, price);
  assert!(block.coinbase().is_some());
  assert!(block.to_string().starts_with("block: 840000\n"));
}

#[test]
fn transaction_count_must_match_header() {
  let raw = raw_block(block_json(10, 1_000_000, vec![coinbase_tx("cb", 50.0)]));
  let err = Block::new(&raw, Price::UNAVAILABLE, Vec::new()).unwrap_err();
  assert!(matches!(err, AppError::Block(_)));
}

#[test]
fn fee_rate_summaries_ignore_transaction_order() {
  let coinbase = coinbase_tx("cb", 6.25);
  let spends = vec![
    (spend_tx("a", &[("p", 0)], &[0.0009], 400), 100_000u64),
    (spend_tx("b", &[("p", 1)], &[0.00045], 800), 50_000),
    (spend_tx("c", &[("p", 2)], &[0.00015], 1000), 20_000),
    (spend_tx("d", &[("p", 3)], &[0.0002], 600), 21_500),
  ];

  let build = |order: &[usize]| {
    let mut values = vec![coinbase.clone()];
    let mut txs = vec![Transaction::from_rpc(&raw_tx(coinbase.clone()), &[]).unwrap()];
    for &i in order {
      let (tx, input) = &spends[i];
      values.push(tx.clone());
      txs.push(Transaction::from_rpc(&raw_tx(tx.clone()), &[*input]).unwrap());
    }
    Block::new(&raw_block(block_json(5, 1_000_000, values)), Price::UNAVAILABLE, txs).unwrap()
  };

  let forward = build(&[0, 1, 2, 3]);
  let shuffled = build(&[2, 0, 3, 1]);

  assert_eq!(forward.mean_fee_rate(), shuffled.mean_fee_rate());
  assert_eq!(forward.median_fee_rate(), shuffled.median_fee_rate());
  assert_eq!(forward.total_fees(), shuffled.total_fees());
  // rates: 100, 25, 20, 10 sat/vB
  assert_eq!(forward.median_fee_rate(), Some(22.5));
  assert_eq!(forward.mean_fee_rate(), Some(38.75));
}

#[test]
fn coinbase_only_block_has_no_fee_rate() {
  let raw = raw_block(block_json(0, 1_231_006_505, vec![coinbase_tx("genesis", 50.0)]));
  let tx = Transaction::from_rpc(&raw_tx(coinbase_tx("genesis", 50.0)), &[]).unwrap();
  let block = Block::new(&raw, Price::UNAVAILABLE, vec![tx]).unwrap();

  assert_eq!(block.total_fees(), 0);
  assert_eq!(block.mean_fee_rate(), None);
  assert_eq!(block.median_fee_rate(), None);
}

#[test]
fn stats_helpers() {
  assert_eq!(stats::median(&[3.0, 1.0, 2.0]), Some(2.0));
  assert_eq!(stats::median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
  assert_eq!(stats::mean(&[]), None);
  assert_eq!(stats::min(&[2.0, -1.0]), Some(-1.0));
  assert_eq!(stats::max(&[2.0, -1.0]), Some(2.0));
}

#[test]
fn unit_conversions() {
  assert_eq!(btc_to_sats(0.0009900), 99_000);
  assert_eq!(btc_to_sats(0.1 + 0.2), 30_000_000);
  assert_eq!(btc_to_sats(-1.0), 0);
  assert_eq!(satoshi_to_btc(1_000).normalize().to_string(), "0.00001");
}

#[test]
fn price_from_usd_truncates() {
  let price = Price::from_usd(64_123.98);
  assert_eq!(price.usd, 64_123);
  assert_eq!(price.sats_per_usd, 1_559);
  assert_eq!(Price::from_usd(0.0), Price::UNAVAILABLE);
  assert!(!Price::UNAVAILABLE.is_available());
}

#[test]
fn download_progress_before_any_header() {
  let info: BlockchainInfo = serde_json::from_value(json!({
    "chain": "main",
    "blocks": 0,
    "headers": 0,
    "bestblockhash": "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f",
    "chainwork": "0000000000000000000000000000000000000000000000000000000100010001",
    "size_on_disk": 293
  }))
  .unwrap();
  assert_eq!(info.download_progress(), 0.0);
  assert!(!info.pruned);
}
