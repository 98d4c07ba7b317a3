//! Command-line harness for exercising the RSSI-weighted mesh router without
//! hardware: wires up an in-memory packet bus between N simulated nodes
//! arranged in a line, lets them beacon each other into their neighbor
//! tables, then drives a route discovery between two of them.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use meshrssi_core::{Frame, NodeId, Role, Router, RouterConfig, Transport};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Parser)]
#[command(name = "meshrssi")]
#[command(author, version, about = "RSSI-weighted mesh router simulator", long_about = None)]
struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover a route between two nodes in a simulated line topology
    Discover {
        /// Number of nodes in the line
        #[arg(long, default_value = "5")]
        nodes: u32,

        /// RSSI degradation in dBm between adjacent nodes in the line
        #[arg(long, default_value = "15")]
        rssi_step: i32,

        /// Maximum simulated ticks before giving up
        #[arg(long, default_value = "50")]
        max_ticks: u32,
    },

    /// Show the constants a default router configuration uses
    Info,
}

/// A single frame in flight, tagged with the RSSI it will arrive at.
struct InFlight {
    frame: Frame,
    arrival_rssi: i8,
}

/// Shared in-memory packet bus connecting every simulated node.
struct Bus {
    queues: std::collections::HashMap<NodeId, VecDeque<InFlight>>,
    cancelled: std::collections::HashSet<(NodeId, u32)>,
    /// RSSI observed between each ordered pair of directly-linked nodes.
    links: std::collections::HashMap<(NodeId, NodeId), i8>,
}

impl Bus {
    fn new() -> Self {
        Bus {
            queues: std::collections::HashMap::new(),
            cancelled: std::collections::HashSet::new(),
            links: std::collections::HashMap::new(),
        }
    }

    fn link(&mut self, a: NodeId, b: NodeId, rssi: i8) {
        self.links.insert((a, b), rssi);
        self.links.insert((b, a), rssi);
    }

    fn deliver(&mut self, from: NodeId, frame: Frame) {
        let targets: Vec<NodeId> = if frame.to.is_broadcast() {
            self.links
                .keys()
                .filter(|(a, _)| *a == from)
                .map(|(_, b)| *b)
                .collect()
        } else {
            vec![frame.to]
        };

        for to in targets {
            if let Some(&rssi) = self.links.get(&(from, to)) {
                self.queues.entry(to).or_default().push_back(InFlight {
                    frame: frame.clone(),
                    arrival_rssi: rssi,
                });
            }
        }
    }
}

/// A [`Transport`] that queues sends onto the shared [`Bus`] instead of
/// touching real hardware.
struct SimTransport {
    node_id: NodeId,
    rssi: i8,
    bus: Rc<RefCell<Bus>>,
}

impl Transport for SimTransport {
    type Error = std::convert::Infallible;

    fn send(&mut self, frame: Frame) -> Result<(), Self::Error> {
        self.bus.borrow_mut().deliver(self.node_id, frame);
        Ok(())
    }

    fn cancel_pending(&mut self, from: NodeId, frame_id: u32) {
        self.bus.borrow_mut().cancelled.insert((from, frame_id));
    }

    fn local_rssi(&self) -> i8 {
        self.rssi
    }

    fn local_node_id(&self) -> NodeId {
        self.node_id
    }
}

fn cmd_discover(nodes: u32, rssi_step: i32, max_ticks: u32) -> Result<()> {
    if nodes < 2 {
        bail!("need at least 2 nodes to discover a route between");
    }

    let bus = Rc::new(RefCell::new(Bus::new()));
    let node_ids: Vec<NodeId> = (0..nodes).map(NodeId::new).collect();

    let link_rssi = (-40i32 - rssi_step).clamp(-120, -30) as i8;
    for window in node_ids.windows(2) {
        bus.borrow_mut().link(window[0], window[1], link_rssi);
    }

    let mut routers: Vec<Router<SimTransport>> = node_ids
        .iter()
        .map(|&id| {
            let transport = SimTransport {
                node_id: id,
                rssi: -40,
                bus: bus.clone(),
            };
            Router::new(transport, Role::Router, RouterConfig::default())
        })
        .collect();

    println!("=== Mesh Route Discovery Simulation ===");
    println!();
    println!("Nodes:     {}", nodes);
    println!("Topology:  line, {} dBm step between hops", rssi_step);
    println!();

    let source = node_ids[0];
    let destination = *node_ids.last().unwrap();
    let mut now = Instant::now();

    for (idx, router) in routers.iter_mut().enumerate() {
        router.tick(now).context("beacon tick failed")?;
        info!(node = idx, "sent initial beacon");
    }
    now += Duration::from_millis(50);
    drain_bus(&bus, &mut routers, &node_ids, now)?;

    println!("Originating route request: {:08x} -> {:08x}", source.as_u32(), destination.as_u32());
    routers[0]
        .submit_outgoing(destination, b"hello mesh".to_vec(), 500, now)
        .context("failed to originate route request")?;

    let mut discovered = false;
    for tick in 0..max_ticks {
        now += Duration::from_millis(100);
        drain_bus(&bus, &mut routers, &node_ids, now)?;

        if routers[0].has_route(destination, now) {
            println!("Route discovered after {} simulated ticks", tick + 1);
            discovered = true;
            break;
        }
    }

    if !discovered {
        println!("No route discovered within {} ticks.", max_ticks);
        return Ok(());
    }

    println!();
    println!("Final route table on node {:08x}:", source.as_u32());
    if routers[0].has_route(destination, now) {
        println!("  -> route to {:08x} established", destination.as_u32());
    }
    println!("Duplicate sends cancelled: {}", bus.borrow().cancelled.len());

    Ok(())
}

fn drain_bus(
    bus: &Rc<RefCell<Bus>>,
    routers: &mut [Router<SimTransport>],
    node_ids: &[NodeId],
    now: Instant,
) -> Result<()> {
    loop {
        let mut delivered_any = false;
        for (idx, &node_id) in node_ids.iter().enumerate() {
            let pending: VecDeque<InFlight> = bus
                .borrow_mut()
                .queues
                .get_mut(&node_id)
                .map(std::mem::take)
                .unwrap_or_default();

            for in_flight in pending {
                delivered_any = true;
                let mut frame = in_flight.frame;
                frame.rx_rssi = in_flight.arrival_rssi;
                routers[idx].filter_incoming(frame, now);
            }
        }
        if !delivered_any {
            break;
        }
    }
    Ok(())
}

fn cmd_info() -> Result<()> {
    let cfg = RouterConfig::default();
    println!("=== Default Router Configuration ===");
    println!();
    println!("Beacon interval:    {:?}", cfg.beacon_interval);
    println!("Route expiry:       {:?}", cfg.route_expiry);
    println!("Neighbor timeout:   {:?}", cfg.neighbor_timeout);
    println!("Dup retention:      {:?}", cfg.dup_retention);
    println!("RSSI threshold:     {} dBm", cfg.rssi_threshold);
    println!("Max hop count:      {}", cfg.max_hop_count);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Discover {
            nodes,
            rssi_step,
            max_ticks,
        } => cmd_discover(nodes, rssi_step, max_ticks),
        Commands::Info => cmd_info(),
    }
}
