use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use ledger_core::{
    constants::{DEFAULT_DIFFICULTY, DEFAULT_MINING_REWARD, DEFAULT_MINING_THREADS},
    CancelToken, Ledger, LedgerConfig, ParallelMiner,
};
use std::str::FromStr;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "Drive an in-memory proof-of-work ledger")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug, Clone)]
struct LedgerArgs {
    /// Leading zero hex characters required in each block hash
    #[arg(long, default_value_t = DEFAULT_DIFFICULTY)]
    difficulty: usize,
    /// Amount paid to the miner of each block
    #[arg(long, default_value_t = DEFAULT_MINING_REWARD)]
    reward: i64,
    /// Mine on a worker pool instead of the calling thread
    #[arg(long)]
    parallel: bool,
    /// Worker threads for --parallel (0 = one per CPU)
    #[arg(long, default_value_t = DEFAULT_MINING_THREADS)]
    threads: usize,
    /// Reject empty addresses and non-positive amounts
    #[arg(long)]
    strict: bool,
    /// Print the whole chain as JSON at the end
    #[arg(long)]
    json: bool,
}

impl LedgerArgs {
    fn config(&self) -> LedgerConfig {
        let config = LedgerConfig::default()
            .with_difficulty(self.difficulty)
            .with_mining_reward(self.reward)
            .with_mining_threads(self.threads);
        if self.strict {
            config.strict()
        } else {
            config
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Two transfers, then two mining rounds, printing balances along the way
    Demo {
        /// Address that receives mining rewards
        #[arg(long, default_value = "myAddress")]
        miner: String,
        #[command(flatten)]
        ledger: LedgerArgs,
    },
    /// Submit transfers and mine them
    Run {
        /// Transfer as FROM:TO:AMOUNT, repeatable
        #[arg(long = "tx")]
        txs: Vec<Transfer>,
        /// Address that receives mining rewards
        #[arg(long)]
        miner: String,
        /// Blocks to mine after submitting
        #[arg(long, default_value_t = 1)]
        rounds: usize,
        #[command(flatten)]
        ledger: LedgerArgs,
    },
}

#[derive(Clone, Debug)]
struct Transfer {
    from: String,
    to: String,
    amount: i64,
}

impl FromStr for Transfer {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(3, ':');
        let (Some(from), Some(to), Some(amount)) = (parts.next(), parts.next(), parts.next())
        else {
            bail!("expected FROM:TO:AMOUNT, got {s:?}");
        };
        let amount = amount
            .parse()
            .with_context(|| format!("invalid amount in {s:?}"))?;
        Ok(Self {
            from: from.to_string(),
            to: to.to_string(),
            amount,
        })
    }
}

/// Owns the ledger plus the optional worker pool used to mine it.
struct Driver {
    ledger: Ledger,
    miner: Option<ParallelMiner>,
    cancel: CancelToken,
}

impl Driver {
    fn new(args: &LedgerArgs) -> Result<Self> {
        let config = args.config();
        let miner = if args.parallel {
            Some(ParallelMiner::from_config(&config)?)
        } else {
            None
        };
        Ok(Self {
            ledger: Ledger::with_config(config)?,
            miner,
            cancel: CancelToken::new(),
        })
    }

    fn mine(&mut self, reward_address: &str) -> Result<()> {
        println!("\nStarting the miner...");
        let block = match &self.miner {
            Some(miner) => self
                .ledger
                .mine_pending_with(reward_address, miner, &self.cancel)?,
            None => self.ledger.mine_pending_transactions(reward_address),
        };
        println!("Block mined: {} (nonce {})", block.hash, block.nonce);
        Ok(())
    }

    fn print_balance(&self, address: &str) {
        println!("Balance of {address} is {}", self.ledger.balance_of(address));
    }

    fn finish(&self, json: bool) -> Result<()> {
        println!("\nIs chain valid? {}", self.ledger.is_valid());
        if json {
            println!("{}", self.ledger.export_chain_json()?);
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .pretty()
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Demo { miner, ledger } => {
            let mut driver = Driver::new(&ledger)?;
            driver.ledger.submit_transaction("address1", "address2", 80)?;
            driver.ledger.submit_transaction("address2", "address1", 50)?;

            driver.mine(&miner)?;
            // the reward for this block is only pending until the next one is mined
            driver.print_balance(&miner);

            driver.mine(&miner)?;
            driver.print_balance(&miner);
            driver.print_balance("address1");
            driver.print_balance("address2");
            driver.finish(ledger.json)?;
        }
        Command::Run {
            txs,
            miner,
            rounds,
            ledger,
        } => {
            let mut driver = Driver::new(&ledger)?;
            for tx in txs {
                driver.ledger.submit_transaction(tx.from, tx.to, tx.amount)?;
            }
            info!(
                pending = driver.ledger.pending_transactions().len(),
                rounds, "submitted transfers"
            );
            for _ in 0..rounds {
                driver.mine(&miner)?;
            }
            let addresses: Vec<String> = driver
                .ledger
                .addresses()
                .into_iter()
                .map(str::to_string)
                .collect();
            for address in &addresses {
                driver.print_balance(address);
            }
            driver.finish(ledger.json)?;
        }
    }
    Ok(())
}
