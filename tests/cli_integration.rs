use assert_cmd::Command;
use serde_json::Value;

const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
const PASSWORD: &str = "CorrectHorseBatteryStaple1!";

fn dkes() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("dkes"));
    cmd.env_remove("DKES_MNEMONIC").env_remove("DKES_PASSWORD");
    cmd
}

fn run_json(args: &[&str]) -> Value {
    let output = dkes().arg("--json").args(args).output().expect("cli runs");
    assert!(output.status.success(), "cli failed: {:?}", output);
    let stdout = String::from_utf8(output.stdout).expect("stdout is utf8");
    serde_json::from_str(&stdout).expect("stdout is valid json")
}

#[test]
fn generate_emits_valid_mnemonic() {
    let json = run_json(&["generate", "--words", "24"]);
    let phrase = json["mnemonic"].as_str().unwrap();
    assert_eq!(phrase.split(' ').count(), 24);
    assert_eq!(json["words"], 24);
    assert!(dkes::facade::validate_mnemonic(phrase).is_ok());
}

#[test]
fn validate_reports_status() {
    let json = run_json(&["validate", "--mnemonic", ABANDON]);
    assert_eq!(json["valid"], true);
    assert_eq!(json["score"]["unique_words"], 2);

    let bad = ABANDON.replace("about", "abandon");
    dkes().args(["validate", "--mnemonic", &bad]).assert().failure();
}

#[test]
fn seed_reads_mnemonic_from_stdin() {
    let output = dkes().arg("seed").write_stdin(ABANDON).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("5eb00bbddcf069084889a8ab9155568165f5c453ccb85e70811aaed6f6da5fc1"));
}

#[test]
fn derive_evm_batch() {
    let json = run_json(&["derive", "evm", "--mnemonic", ABANDON, "--count", "2"]);
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["address"], "0x9858EfFD232B4033E47d90003D41EC34EcaEda94");
    assert_eq!(rows[0]["path"], "m/44'/60'/0'/0/0");
    assert_eq!(rows[1]["path"], "m/44'/60'/0'/0/1");
    assert!(rows[0].get("private_key").is_none());
}

#[test]
fn derive_bitcoin_and_solana() {
    let legacy = run_json(&["derive", "bitcoin", "--mnemonic", ABANDON]);
    assert_eq!(legacy[0]["address"], "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA");

    let segwit = run_json(&["derive", "bitcoin", "--segwit", "--mnemonic", ABANDON]);
    assert_eq!(segwit[0]["address"], "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu");

    let solana = run_json(&["derive", "solana", "--mnemonic", ABANDON]);
    assert_eq!(solana[0]["address"], "HAgk14JpMQLgt6rVgv7cBQFJWFto5Dqxi472uT3DKpqk");
    assert_eq!(solana[0]["path"], "m/44'/501'/0'/0'");
}

#[test]
fn derive_shows_secret_only_on_request() {
    let json = run_json(&["derive", "evm", "--mnemonic", ABANDON, "--show-secret"]);
    let secret = json[0]["private_key"].as_str().unwrap();
    assert_eq!(secret.len(), 64);
}

#[test]
fn bip85_child() {
    let json = run_json(&["bip85", "--mnemonic", ABANDON, "--words", "18", "--index", "2"]);
    assert_eq!(json["record"]["path"], "m/83696968'/39'/0'/0'/0'/1'/2'");
    let phrase = json["mnemonic"].as_str().unwrap();
    assert_eq!(phrase.split(' ').count(), 18);
}

#[test]
fn encrypt_then_decrypt() {
    let output = dkes()
        .args(["encrypt", "--password", PASSWORD, "--input", "secret"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{:?}", output);
    let envelope = String::from_utf8(output.stdout).unwrap();

    let parsed: Value = serde_json::from_str(&envelope).unwrap();
    assert_eq!(parsed["version"], "2.0");
    assert_eq!(parsed["algorithm"], "aes-256-gcm");
    assert!(parsed.get("authTag").is_some());

    let output = dkes()
        .arg("decrypt")
        .env("DKES_PASSWORD", PASSWORD)
        .write_stdin(envelope.clone())
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap().trim(), "secret");

    dkes()
        .args(["decrypt", "--password", "WrongHorseBatteryStaple1!"])
        .write_stdin(envelope)
        .assert()
        .failure();
}

#[test]
fn encrypt_rejects_weak_password() {
    dkes()
        .args(["encrypt", "--password", "password", "--input", "secret"])
        .assert()
        .failure();
}

#[test]
fn multisig_p2sh_and_safe() {
    let keys = [
        "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
        "02c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5",
        "02f9308a019258c31049344f85f89d5229b531c845836f99b08601f113bce036f9",
    ];
    let mut args = vec!["multisig", "p2sh", "--threshold", "2"];
    for key in &keys {
        args.extend(["--member", *key]);
    }
    let json = run_json(&args);
    assert!(json["address"].as_str().unwrap().starts_with('3'));
    assert_eq!(json["kind"], "p2sh");

    let json = run_json(&[
        "multisig", "safe", "--threshold", "2", "--salt-nonce", "1",
        "--member", "0x9858EfFD232B4033E47d90003D41EC34EcaEda94",
        "--member", "0x1111111111111111111111111111111111111111",
    ]);
    assert_eq!(json["address"], "0x29e8f50E64d7837dfadAA636AaE5Cc1873c86338");
    assert_eq!(json["safe"]["deployed"], false);

    dkes()
        .args(["multisig", "p2wsh", "--threshold", "3", "--member", keys[0], "--member", keys[1]])
        .assert()
        .failure();
}

#[test]
fn multisig_defaults_to_majority_threshold() {
    let json = run_json(&[
        "multisig", "p2wsh",
        "--member", "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
        "--member", "02c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5",
        "--member", "02f9308a019258c31049344f85f89d5229b531c845836f99b08601f113bce036f9",
    ]);
    assert_eq!(json["canonical_config"]["threshold"], 2);
    assert!(json["address"].as_str().unwrap().starts_with("bc1q"));
}

#[test]
fn check_address_reports_network() {
    let json = run_json(&["check-address", "bitcoin", "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu"]);
    assert_eq!(json["is_valid"], true);
    assert_eq!(json["address_type"], "p2wpkh");

    let json = run_json(&["check-address", "evm", "0x9858effd232b4033e47d90003d41ec34ecaeda94"]);
    assert_eq!(json["normalized"], "0x9858EfFD232B4033E47d90003D41EC34EcaEda94");

    dkes()
        .args(["check-address", "bitcoin", "--testnet", "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu"])
        .assert()
        .failure();
}

#[test]
fn score_password_json() {
    let json = run_json(&["score-password", PASSWORD]);
    assert_eq!(json["score"], 100);
    assert_eq!(json["label"], "very_strong");
}
