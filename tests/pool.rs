// tests/pool.rs
use gxc_miner_rs::ledger::{Ledger, MemoryLedger};
use gxc_miner_rs::miner::job::JobTransaction;
use gxc_miner_rs::miner::target::check_difficulty_target;
use gxc_miner_rs::stratum::{
    OpenAuthenticator, PoolSettings, StratumJob, StratumServer, StratumShare, share_hash,
};
use gxc_miner_rs::utils::unix_time;
use std::sync::Arc;
use std::time::Duration;

const EXTRA_NONCE2: &str = "0000002a";

fn pool(ledger: Arc<MemoryLedger>, settings: PoolSettings) -> StratumServer {
    StratumServer::new(
        PoolSettings {
            pool_address: "GXCpool".to_string(),
            ..settings
        },
        ledger,
        Arc::new(OpenAuthenticator),
    )
}

fn share(job: &StratumJob, miner_id: &str, nonce: u64) -> StratumShare {
    StratumShare {
        job_id: job.job_id().to_string(),
        nonce: format!("{:x}", nonce),
        extra_nonce2: EXTRA_NONCE2.to_string(),
        miner_id: miner_id.to_string(),
    }
}

/// First nonce whose pool hash meets `difficulty`
fn find_nonce(job: &StratumJob, difficulty: f64) -> u64 {
    (0..u64::MAX)
        .find(|n| {
            check_difficulty_target(
                &share_hash(&job.job, *n, &job.extra_nonce1, EXTRA_NONCE2),
                difficulty,
            )
        })
        .unwrap_or_default()
}

#[test]
fn counters_add_up_to_submissions() {
    let server = pool(
        Arc::new(MemoryLedger::new(1_000_000.0)),
        PoolSettings {
            pool_difficulty: 0.0,
            ..Default::default()
        },
    );
    server.add_miner("m1", "127.0.0.1:5000");
    assert!(server.authorize_miner("m1", "worker", "x"));
    let job = server.latest_job().unwrap();

    let submissions = 200u64;
    for nonce in 0..submissions {
        server.submit_share("m1", &share(&job, "m1", nonce));
    }
    let miner = server.miner("m1").unwrap();
    assert_eq!(miner.shares_accepted + miner.shares_rejected, submissions);

    let stats = server.stats();
    assert_eq!(stats.shares_accepted + stats.shares_rejected, submissions);
    assert_eq!(stats.authorized_miners, 1);
}

#[test]
fn share_below_network_difficulty_is_not_submitted() {
    let ledger = Arc::new(MemoryLedger::new(1_000_000.0));
    let server = pool(
        ledger.clone(),
        PoolSettings {
            pool_difficulty: 0.0,
            ..Default::default()
        },
    );
    server.add_miner("m1", "peer");
    server.authorize_miner("m1", "worker", "x");
    let job = server.latest_job().unwrap();

    let response = server.submit_share("m1", &share(&job, "m1", find_nonce(&job, 0.0)));
    assert!(response.accepted);
    assert!(!response.block_candidate);
    assert_eq!(ledger.submission_count(), 0);
    assert_eq!(server.stats().blocks_found, 0);
}

#[test]
fn share_meeting_network_difficulty_becomes_a_block() {
    let ledger = Arc::new(MemoryLedger::new(0.0));
    let now = unix_time();
    let pending = JobTransaction::transfer(&"f".repeat(64), 8.0, 1.0, now);
    ledger.add_pending(pending.clone());

    let server = pool(
        ledger.clone(),
        PoolSettings {
            pool_difficulty: 0.0,
            ..Default::default()
        },
    );
    server.add_miner("m1", "peer");
    server.authorize_miner("m1", "worker", "x");
    let job = server.latest_job().unwrap();
    assert_eq!(job.job.transactions.len(), 2);

    let response = server.submit_share("m1", &share(&job, "m1", find_nonce(&job, 0.0)));
    assert!(response.accepted);
    assert!(response.block_candidate);
    assert_eq!(ledger.submission_count(), 1);
    assert_eq!(ledger.get_height().unwrap(), 1);

    let block = ledger.get_latest_block().unwrap();
    assert_eq!(block.miner_address, "GXCpool");
    assert_eq!(block.extra_nonce, format!("{}{}", job.extra_nonce1, EXTRA_NONCE2));
    assert!(block.transactions[0].coinbase);
    assert_eq!(server.stats().blocks_found, 1);
}

#[test]
fn ledger_rejection_still_accepts_the_share() {
    let ledger = Arc::new(MemoryLedger::new(0.0));
    ledger.set_reject_all(true);
    let server = pool(
        ledger.clone(),
        PoolSettings {
            pool_difficulty: 0.0,
            ..Default::default()
        },
    );
    server.add_miner("m1", "peer");
    server.authorize_miner("m1", "worker", "x");
    let job = server.latest_job().unwrap();

    let response = server.submit_share("m1", &share(&job, "m1", find_nonce(&job, 0.0)));
    assert!(response.accepted);
    assert_eq!(ledger.submission_count(), 1);
    assert_eq!(server.stats().blocks_found, 0);
}

#[test]
fn default_pool_credits_shares_below_the_network_bar() {
    let ledger = Arc::new(MemoryLedger::new(1000.0));
    let server = pool(ledger.clone(), PoolSettings::default());
    server.add_miner("m1", "peer");
    server.authorize_miner("m1", "worker", "x");
    let job = server.latest_job().unwrap();
    assert!(job.pool_difficulty < job.network_difficulty());

    let nonce = (0..u64::MAX)
        .find(|n| {
            let hash = share_hash(&job.job, *n, &job.extra_nonce1, EXTRA_NONCE2);
            check_difficulty_target(&hash, job.pool_difficulty)
                && !check_difficulty_target(&hash, job.network_difficulty())
        })
        .unwrap_or_default();
    let response = server.submit_share("m1", &share(&job, "m1", nonce));
    assert!(response.accepted);
    assert!(!response.block_candidate);
    assert_eq!(server.miner("m1").unwrap().shares_accepted, 1);
    assert_eq!(ledger.submission_count(), 0);
    assert_eq!(server.stats().blocks_found, 0);
}

#[test]
fn evicted_miner_is_rejected_as_unauthorized() {
    let server = pool(
        Arc::new(MemoryLedger::new(1.0)),
        PoolSettings {
            pool_difficulty: 0.0,
            inactivity_timeout: Duration::from_millis(30),
            ..Default::default()
        },
    );
    server.add_miner("m1", "peer");
    server.authorize_miner("m1", "worker", "x");
    let job = server.latest_job().unwrap();

    std::thread::sleep(Duration::from_millis(80));
    assert_eq!(server.cleanup_inactive_miners(), vec!["m1".to_string()]);

    let response = server.submit_share("m1", &share(&job, "m1", find_nonce(&job, 0.0)));
    assert!(!response.accepted);
    assert_eq!(response.reason.as_deref(), Some("Unauthorized"));
    assert!(server.connected_miners().is_empty());
}

#[test]
fn shares_for_evicted_jobs_are_rejected() {
    let server = pool(Arc::new(MemoryLedger::new(1.0)), PoolSettings::default());
    server.add_miner("m1", "peer");
    server.authorize_miner("m1", "worker", "x");
    let old = server.latest_job().unwrap();
    for _ in 0..10 {
        server.generate_mining_job(true).unwrap();
    }

    let response = server.submit_share("m1", &share(&old, "m1", 1));
    assert_eq!(response.reason.as_deref(), Some("Job not found"));
    assert_eq!(server.stats().cached_jobs, 10);
}
