//! Rastermill CLI entry point

use anyhow::{Context, Result};
use rastermill::config::cli::{Cli, ExecutionMode};
use rastermill::config::{toml as config_toml, validator, Config};
use rastermill::distributed::{DistributedCoordinator, WorkerService};
use rastermill::filter;
use rastermill::raster::codec;
use rastermill::raster::PixelBuffer;
use std::path::Path;
use std::time::{Duration, Instant};

fn main() -> Result<()> {
    println!("rastermill v{}", env!("CARGO_PKG_VERSION"));
    println!("Distributed image-convolution filtering");
    println!();

    let cli = Cli::parse_args();
    cli.validate()?;

    let config = config_toml::build_config(&cli)?;
    validator::validate_config(&config).context("Configuration validation failed")?;

    match cli.mode {
        ExecutionMode::Sequential => run_sequential(&cli, &config),
        ExecutionMode::Parallel => run_parallel(&cli, &config),
        ExecutionMode::Distributed => run_distributed(&cli, &config),
        ExecutionMode::Service => run_service(&cli),
    }
}

/// Paths are guaranteed by `Cli::validate` for the filtering modes
fn io_paths(cli: &Cli) -> Result<(&Path, &Path)> {
    let input = cli.input.as_deref().context("Input path required")?;
    let output = cli.output.as_deref().context("Output path required")?;
    Ok((input, output))
}

fn load_source(input: &Path, config: &Config) -> Result<PixelBuffer> {
    let image = codec::load_image(input)?;
    println!("Processing image: {}", input.display());
    println!("Image dimensions: {}x{}", image.width(), image.height());
    println!("Operation: {:?}", config.filter.operation);
    println!("Boundary policy: {:?}", config.filter.boundary);
    Ok(image)
}

/// Run in sequential mode (single thread)
fn run_sequential(cli: &Cli, config: &Config) -> Result<()> {
    let (input, output) = io_paths(cli)?;
    let image = load_source(input, config)?;
    let kernel = config.filter.resolve_kernel()?;

    let start = Instant::now();
    let filtered = filter::convolve(&image, &kernel, config.filter.boundary);
    let elapsed = start.elapsed();

    codec::save_image(&filtered, output)?;

    println!("Image processed successfully! Check {}", output.display());
    println!("Execution time: {:.2} ms", elapsed.as_secs_f64() * 1000.0);
    Ok(())
}

/// Run in row-parallel mode (rayon pool, one process)
fn run_parallel(cli: &Cli, config: &Config) -> Result<()> {
    let (input, output) = io_paths(cli)?;
    let image = load_source(input, config)?;
    let kernel = config.filter.resolve_kernel()?;

    let start = Instant::now();
    let filtered = filter::parallel::convolve_parallel(&image, &kernel, config.filter.boundary);
    let elapsed = start.elapsed();

    codec::save_image(&filtered, output)?;

    println!("Image processed successfully! Check {}", output.display());
    println!("Execution time: {:.2} ms", elapsed.as_secs_f64() * 1000.0);
    println!("Available processors: {}", num_cpus::get());
    Ok(())
}

/// Run in distributed mode (coordinator)
fn run_distributed(cli: &Cli, config: &Config) -> Result<()> {
    let (input, output) = io_paths(cli)?;
    let image = load_source(input, config)?;
    let kernel = config.filter.resolve_kernel()?;
    let deadline = config.runtime.timeout_secs.map(Duration::from_secs);

    // Worker endpoints: explicit host list, or self-launched local services
    let (worker_addresses, local_workers) = if let Some(ref host_list) = cli.host_list {
        let addresses = parse_host_list(host_list, cli.worker_port);
        (addresses, Vec::new())
    } else {
        println!("Launching {} local worker services...", config.workers.count);
        let mut addresses = Vec::new();
        let mut children = Vec::new();
        for port in find_available_ports(config.workers.count, cli.debug)? {
            children.push(launch_local_worker(port, cli)?);
            addresses.push(format!("127.0.0.1:{}", port));
        }
        // Give the services a moment to bind
        std::thread::sleep(Duration::from_millis(500));
        (addresses, children)
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    let result = runtime.block_on(async {
        let coordinator = DistributedCoordinator::new(
            kernel,
            config.filter.boundary,
            worker_addresses,
            deadline,
        )
        .context("Failed to create coordinator")?;

        coordinator.run(&image).await
    });

    for child in local_workers {
        if let Err(e) = cleanup_worker(child, cli.debug) {
            eprintln!("Warning: Failed to cleanup worker service: {}", e);
        }
    }

    // The output file is written only after every result has landed; a
    // failed run leaves no half-populated image behind.
    let filtered = result?;
    codec::save_image(&filtered, output)?;

    println!();
    println!("Image processed successfully! Check {}", output.display());
    Ok(())
}

/// Run in service mode (distributed worker)
fn run_service(cli: &Cli) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    runtime.block_on(async {
        let service =
            WorkerService::new(cli.listen_port).context("Failed to create worker service")?;

        service.run().await
    })
}

/// Expand a comma-separated host list, appending the default worker port
/// where missing
fn parse_host_list(host_list: &str, default_port: u16) -> Vec<String> {
    host_list
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|addr| {
            if addr.contains(':') {
                addr.to_string()
            } else {
                format!("{}:{}", addr, default_port)
            }
        })
        .collect()
}

/// Find `count` free ports for local worker services
fn find_available_ports(count: usize, debug: bool) -> Result<Vec<u16>> {
    use std::net::TcpListener;

    let mut ports = Vec::with_capacity(count);
    for port in 9900..10100 {
        if ports.len() == count {
            break;
        }
        if let Ok(listener) = TcpListener::bind(("127.0.0.1", port)) {
            drop(listener);
            if debug {
                eprintln!("DEBUG: Port {} is available", port);
            }
            ports.push(port);
        }
    }

    if ports.len() < count {
        anyhow::bail!(
            "Only {} of {} required ports available in range 9900-10099. Close other rastermill instances or use --host-list.",
            ports.len(),
            count
        );
    }

    Ok(ports)
}

/// Launch a local worker service in the background
fn launch_local_worker(port: u16, cli: &Cli) -> Result<std::process::Child> {
    use std::process::{Command, Stdio};

    let exe_path = std::env::current_exe().context("Failed to get current executable path")?;

    let mut cmd = Command::new(&exe_path);
    cmd.arg("--mode").arg("service");
    cmd.arg("--listen-port").arg(port.to_string());

    if cli.debug {
        let log_path = format!("/tmp/rastermill_worker_{}.log", port);
        let log_file =
            std::fs::File::create(&log_path).context("Failed to create worker log file")?;
        cmd.stdout(Stdio::from(log_file.try_clone()?));
        cmd.stderr(Stdio::from(log_file));
        eprintln!("DEBUG: Worker log: {}", log_path);
    } else {
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());
    }

    let child = cmd.spawn().context("Failed to spawn worker service process")?;

    if cli.debug {
        eprintln!("DEBUG: Worker service launched on port {} (PID: {})", port, child.id());
    }

    Ok(child)
}

/// Terminate a self-launched worker service
fn cleanup_worker(mut child: std::process::Child, debug: bool) -> Result<()> {
    if let Some(status) = child.try_wait()? {
        if debug {
            eprintln!("DEBUG: Worker service already exited with status: {}", status);
        }
        return Ok(());
    }

    // Worker services loop forever waiting for coordinators; kill them
    child.kill()?;
    let status = child.wait()?;
    if debug {
        eprintln!("DEBUG: Worker service stopped with status: {}", status);
    }

    Ok(())
}
