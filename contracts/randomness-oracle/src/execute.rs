use cosmwasm_std::{
    to_json_binary, DepsMut, Env, Event, MessageInfo, Order, Response, StdResult, Storage, SubMsg,
    WasmMsg,
};
use cw_storage_plus::Bound;
use loot_box_common::msg::LootBoxCallbackMsg;
use loot_box_common::randomness::derive_random_word;

use crate::error::ContractError;
use crate::state::{
    Job, JobStatus, OracleConfig, StoredBeacon, BEACONS, CONFIG, JOBS, LATEST_ROUND, NEXT_JOB_ID,
    PENDING_JOBS,
};
use crate::verify::verify_beacon;

/// Upper bound on callbacks dispatched by one `deliver_pending`.
pub const MAX_DELIVERY_BATCH: u32 = 100;

pub fn validate_max_callbacks(max_callbacks_per_beacon: u32) -> Result<(), ContractError> {
    if max_callbacks_per_beacon == 0 || max_callbacks_per_beacon > MAX_DELIVERY_BATCH {
        return Err(ContractError::InvalidConfig {
            reason: format!(
                "max_callbacks_per_beacon must be between 1 and {}",
                MAX_DELIVERY_BATCH
            ),
        });
    }
    Ok(())
}

/// Queue a randomness job for the calling contract.
///
/// The job is answered by the beacon for `target_round` and no other. The
/// target is always later than both the current drand round and the latest
/// stored beacon, so its randomness is unknown when the job is queued.
pub fn request_randomness(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    job_id: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let latest = LATEST_ROUND.may_load(deps.storage)?.unwrap_or(0);
    let target_round = config.round_at(env.block.time).max(latest) + 1;

    let id = NEXT_JOB_ID.may_load(deps.storage)?.unwrap_or(0);
    NEXT_JOB_ID.save(deps.storage, &(id + 1))?;

    let job = Job {
        id,
        requester: info.sender.clone(),
        job_id,
        target_round,
        requested_at: env.block.time,
        status: JobStatus::Pending,
    };
    JOBS.save(deps.storage, id, &job)?;
    PENDING_JOBS.save(deps.storage, (target_round, id), &())?;

    Ok(Response::new()
        .set_data(to_json_binary(&id)?)
        .add_attribute("action", "request_randomness")
        .add_attribute("id", id.to_string())
        .add_event(
            Event::new("oracle_randomness_requested")
                .add_attribute("id", id.to_string())
                .add_attribute("requester", info.sender.to_string())
                .add_attribute("job_id", job_id.to_string())
                .add_attribute("target_round", target_round.to_string()),
        ))
}

/// Submit a drand beacon. Only operators can call this.
///
/// After the beacon is verified and stored, up to `max_callbacks_per_beacon`
/// jobs targeting this round are delivered.
pub fn submit_beacon(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    round: u64,
    signature_hex: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;

    if !config.operators.contains(&info.sender) {
        return Err(ContractError::Unauthorized {
            reason: "only operators can submit beacons".to_string(),
        });
    }

    if BEACONS.has(deps.storage, round) {
        return Err(ContractError::BeaconAlreadyExists { round });
    }

    let signature = hex::decode(&signature_hex).map_err(|_| ContractError::InvalidHex {
        field: "signature_hex".to_string(),
    })?;

    let randomness = verify_beacon(&config.quicknet_pubkey, round, &signature).map_err(|e| {
        ContractError::VerificationFailed {
            reason: e.to_string(),
        }
    })?;

    let beacon = StoredBeacon {
        round,
        randomness: randomness.to_vec(),
        signature,
        verified: true,
        submitted_at: env.block.time,
        submitted_by: info.sender.clone(),
    };
    BEACONS.save(deps.storage, round, &beacon)?;

    let current_latest = LATEST_ROUND.may_load(deps.storage)?.unwrap_or(0);
    if round > current_latest {
        LATEST_ROUND.save(deps.storage, &round)?;
    }

    let ready = PENDING_JOBS
        .prefix(round)
        .keys(deps.storage, None, None, Order::Ascending)
        .take(config.max_callbacks_per_beacon as usize)
        .map(|id| id.map(|id| (round, id)))
        .collect::<StdResult<Vec<_>>>()?;
    let (callbacks, events) = deliver_jobs(deps.storage, ready)?;

    Ok(Response::new()
        .add_submessages(callbacks)
        .add_attribute("action", "submit_beacon")
        .add_attribute("round", round.to_string())
        .add_attribute("submitted_by", info.sender.to_string())
        .add_attribute("delivered", events.len().to_string())
        .add_event(
            Event::new("oracle_beacon_submitted")
                .add_attribute("round", round.to_string())
                .add_attribute("randomness", hex::encode(randomness))
                .add_attribute("submitted_by", info.sender.to_string())
                .add_attribute("timestamp", env.block.time.seconds().to_string()),
        )
        .add_events(events))
}

/// Deliver queued jobs whose target-round beacon is already stored, oldest
/// round first. Anyone can call.
///
/// Jobs whose target round has no beacon yet are skipped, not answered with a
/// later one.
pub fn deliver_pending(
    deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    limit: Option<u32>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let latest = LATEST_ROUND.may_load(deps.storage)?.unwrap_or(0);
    if latest == 0 {
        return Err(ContractError::BeaconNotFound { round: 0 });
    }

    let limit = limit
        .unwrap_or(config.max_callbacks_per_beacon)
        .min(MAX_DELIVERY_BATCH) as usize;
    let upper = Bound::exclusive((latest.saturating_add(1), 0u64));
    let mut ready = Vec::new();
    for key in PENDING_JOBS.keys(deps.storage, None, Some(upper), Order::Ascending) {
        if ready.len() >= limit {
            break;
        }
        let (target_round, id) = key?;
        if BEACONS.has(deps.storage, target_round) {
            ready.push((target_round, id));
        }
    }
    let (callbacks, events) = deliver_jobs(deps.storage, ready)?;

    Ok(Response::new()
        .add_submessages(callbacks)
        .add_attribute("action", "deliver_pending")
        .add_attribute("latest_round", latest.to_string())
        .add_attribute("delivered", events.len().to_string())
        .add_events(events))
}

/// Build callbacks for `(target_round, id)` pending entries. Each job's word
/// comes from the beacon of its own target round.
///
/// Jobs are marked Delivered here; a callback the requester rejects comes back
/// through `reply` and is marked Failed.
fn deliver_jobs(
    storage: &mut dyn Storage,
    ready: Vec<(u64, u64)>,
) -> Result<(Vec<SubMsg>, Vec<Event>), ContractError> {
    let mut callbacks = Vec::with_capacity(ready.len());
    let mut events = Vec::with_capacity(ready.len());
    let mut cached: Option<StoredBeacon> = None;
    for (target_round, id) in ready {
        let beacon = match cached.take() {
            Some(beacon) if beacon.round == target_round => beacon,
            _ => BEACONS
                .may_load(storage, target_round)?
                .ok_or(ContractError::BeaconNotFound {
                    round: target_round,
                })?,
        };

        PENDING_JOBS.remove(storage, (target_round, id));
        let mut job = JOBS.load(storage, id)?;

        let random_word =
            derive_random_word(&beacon.randomness, job.requester.as_str(), job.job_id);
        job.status = JobStatus::Delivered {
            round: beacon.round,
        };
        JOBS.save(storage, id, &job)?;

        let callback = WasmMsg::Execute {
            contract_addr: job.requester.to_string(),
            msg: to_json_binary(&LootBoxCallbackMsg::Fulfill {
                request_id: job.job_id,
                random_word,
            })?,
            funds: vec![],
        };
        callbacks.push(SubMsg::reply_on_error(callback, id));
        events.push(
            Event::new("oracle_job_delivered")
                .add_attribute("id", id.to_string())
                .add_attribute("requester", job.requester.to_string())
                .add_attribute("job_id", job.job_id.to_string())
                .add_attribute("round", beacon.round.to_string())
                .add_attribute("random_word", random_word.to_string()),
        );
        cached = Some(beacon);
    }

    Ok((callbacks, events))
}

/// Record a callback the requester rejected. Called from `reply`.
pub fn job_failed(
    deps: DepsMut,
    _env: Env,
    id: u64,
    reason: String,
) -> Result<Response, ContractError> {
    let Some(mut job) = JOBS.may_load(deps.storage, id)? else {
        return Ok(Response::new()
            .add_attribute("action", "job_failed")
            .add_attribute("id", id.to_string())
            .add_attribute("outcome", "unknown_job"));
    };

    let round = match job.status {
        JobStatus::Delivered { round } => round,
        JobStatus::Pending | JobStatus::Failed { .. } => {
            return Ok(Response::new()
                .add_attribute("action", "job_failed")
                .add_attribute("id", id.to_string())
                .add_attribute("outcome", "ignored"))
        }
    };
    job.status = JobStatus::Failed {
        round,
        reason: reason.clone(),
    };
    JOBS.save(deps.storage, id, &job)?;

    Ok(Response::new()
        .add_attribute("action", "job_failed")
        .add_attribute("id", id.to_string())
        .add_event(
            Event::new("oracle_job_failed")
                .add_attribute("id", id.to_string())
                .add_attribute("requester", job.requester.to_string())
                .add_attribute("job_id", job.job_id.to_string())
                .add_attribute("round", round.to_string())
                .add_attribute("reason", reason),
        ))
}

fn assert_admin(config: &OracleConfig, info: &MessageInfo, what: &str) -> Result<(), ContractError> {
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {
            reason: format!("only admin can {}", what),
        });
    }
    Ok(())
}

/// Update the operator list. Admin only.
pub fn update_operators(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    add: Vec<String>,
    remove: Vec<String>,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    assert_admin(&config, &info, "update operators")?;

    for addr_str in &remove {
        let addr = deps.api.addr_validate(addr_str)?;
        config.operators.retain(|a| *a != addr);
    }

    for addr_str in &add {
        let addr = deps.api.addr_validate(addr_str)?;
        if !config.operators.contains(&addr) {
            config.operators.push(addr);
        }
    }

    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "update_operators")
        .add_attribute("added", add.join(","))
        .add_attribute("removed", remove.join(","))
        .add_attribute("operators", config.operators.len().to_string())
        .add_event(
            Event::new("oracle_operators_updated")
                .add_attribute("added", add.join(","))
                .add_attribute("removed", remove.join(","))
                .add_attribute(
                    "operators",
                    config
                        .operators
                        .iter()
                        .map(|a| a.as_str())
                        .collect::<Vec<_>>()
                        .join(","),
                ),
        ))
}

/// Update admin or delivery batch size. Admin only.
pub fn update_config(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    admin: Option<String>,
    max_callbacks_per_beacon: Option<u32>,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    assert_admin(&config, &info, "update config")?;

    if let Some(admin) = admin {
        config.admin = deps.api.addr_validate(&admin)?;
    }
    if let Some(max) = max_callbacks_per_beacon {
        validate_max_callbacks(max)?;
        config.max_callbacks_per_beacon = max;
    }
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "update_config")
        .add_event(
            Event::new("oracle_config_updated")
                .add_attribute("admin", config.admin.to_string())
                .add_attribute(
                    "max_callbacks_per_beacon",
                    config.max_callbacks_per_beacon.to_string(),
                ),
        ))
}
