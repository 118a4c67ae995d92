//! Interactive console. Runs the Order service, the Shipment service or both,
//! over RabbitMQ or the in-memory broker (see `--help`).

use clap::Parser;
use order_sync::cli::Cli;
use order_sync::console::{
    self, format_order, format_shipment, parse_menu_choice, parse_price, parse_shipment_id, parse_status_choice,
    require_text, InputError, MenuChoice, StatusChoice,
};
use order_sync::lifecycle::{setup_tracing, OrderSystem, ShipmentSystem};
use order_sync::model::{OrderCreate, ShipmentUpdate};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{error, info, warn};

struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Prints `label` and reads one line. `None` on end of input.
    async fn ask(&mut self, label: &str) -> Option<String> {
        print!("{label}");
        let _ = std::io::stdout().flush();
        match self.lines.next_line().await {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "Failed to read input");
                None
            }
        }
    }
}

enum Step {
    Continue,
    Quit,
}

async fn create_order(prompt: &mut Prompt, orders: &OrderSystem) -> Option<Result<(), InputError>> {
    println!("\n=== New order ===");
    let name = match require_text(&prompt.ask("Customer name: ").await?, "customer name") {
        Ok(name) => name,
        Err(e) => return Some(Err(e)),
    };
    let address = match require_text(&prompt.ask("Shipping address: ").await?, "shipping address") {
        Ok(address) => address,
        Err(e) => return Some(Err(e)),
    };
    let total_price = match parse_price(&prompt.ask("Total price: ").await?) {
        Ok(price) => price,
        Err(e) => return Some(Err(e)),
    };

    let params = OrderCreate {
        customer_name: name,
        shipping_address: address,
        total_price,
    };
    match orders.order_client.place_order(params).await {
        Ok(order) => println!("Order #{} created with status {}", order.id, order.status),
        Err(e) => println!("Could not create order: {e}"),
    }
    Some(Ok(()))
}

async fn update_shipment(prompt: &mut Prompt, shipments: &ShipmentSystem) -> Option<Result<(), InputError>> {
    let client = &shipments.shipment_client;
    if client.shipments().is_empty() {
        println!("\nNo shipments yet");
        return Some(Ok(()));
    }
    list_shipments(shipments);

    let id = match parse_shipment_id(&prompt.ask("Shipment id: ").await?) {
        Ok(id) => id,
        Err(e) => return Some(Err(e)),
    };
    if client.get(id).is_none() {
        println!("Shipment #{id} not found");
        return Some(Ok(()));
    }

    println!("{}", console::STATUS_MENU);
    let choice = match parse_status_choice(&prompt.ask("New status: ").await?) {
        Ok(choice) => choice,
        Err(e) => return Some(Err(e)),
    };
    let update = match choice {
        StatusChoice::Packed => ShipmentUpdate::Pack,
        StatusChoice::Shipped => {
            let carrier = match require_text(&prompt.ask("Carrier: ").await?, "carrier") {
                Ok(carrier) => carrier,
                Err(e) => return Some(Err(e)),
            };
            let tracking_number = match require_text(&prompt.ask("Tracking number: ").await?, "tracking number") {
                Ok(tracking) => tracking,
                Err(e) => return Some(Err(e)),
            };
            ShipmentUpdate::Ship {
                carrier,
                tracking_number,
            }
        }
        StatusChoice::Delivered => ShipmentUpdate::Deliver,
    };

    match client.update_status(id, update).await {
        Ok(shipment) => println!("Shipment #{} is now {}", shipment.id, shipment.status),
        Err(e) => println!("Could not update shipment: {e}"),
    }
    Some(Ok(()))
}

fn list_orders(orders: &OrderSystem) {
    let all = orders.order_client.orders();
    if all.is_empty() {
        println!("\nNo orders yet");
        return;
    }
    println!("\n=== Orders ===");
    for order in all {
        println!("{}", format_order(&order));
    }
}

fn list_shipments(shipments: &ShipmentSystem) {
    let all = shipments.shipment_client.shipments();
    if all.is_empty() {
        println!("\nNo shipments yet");
        return;
    }
    println!("\n=== Shipments ===");
    for shipment in all {
        println!("{}", format_shipment(&shipment));
    }
}

fn not_here(service: &str) -> Option<Result<(), InputError>> {
    println!("\nThe {service} service does not run in this process");
    Some(Ok(()))
}

async fn step(prompt: &mut Prompt, orders: Option<&OrderSystem>, shipments: Option<&ShipmentSystem>) -> Step {
    println!("\n{}", console::MENU);
    let Some(input) = prompt.ask("Choice: ").await else {
        return Step::Quit;
    };

    let outcome = match parse_menu_choice(&input) {
        Ok(MenuChoice::Exit) => return Step::Quit,
        Ok(MenuChoice::CreateOrder) => match orders {
            Some(orders) => create_order(prompt, orders).await,
            None => not_here("order"),
        },
        Ok(MenuChoice::ListOrders) => match orders {
            Some(orders) => {
                list_orders(orders);
                Some(Ok(()))
            }
            None => not_here("order"),
        },
        Ok(MenuChoice::ListShipments) => match shipments {
            Some(shipments) => {
                list_shipments(shipments);
                Some(Ok(()))
            }
            None => not_here("shipment"),
        },
        Ok(MenuChoice::UpdateShipment) => match shipments {
            Some(shipments) => update_shipment(prompt, shipments).await,
            None => not_here("shipment"),
        },
        Err(e) => Some(Err(e)),
    };

    match outcome {
        Some(Ok(())) => Step::Continue,
        Some(Err(e)) => {
            println!("Invalid input: {e}");
            Step::Continue
        }
        None => Step::Quit,
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let cli = Cli::parse();
    setup_tracing();
    info!(service = ?cli.service, broker = ?cli.broker, "Starting order/shipment console");
    if cli.runs_without_peer() {
        warn!("In-memory broker with a single service: events have no peer process");
    }

    let config = cli.sync_config();
    let broker = cli.connect();
    let shipments = if cli.service.runs_shipments() {
        Some(ShipmentSystem::start(broker.clone(), &config).await)
    } else {
        None
    };
    let orders = if cli.service.runs_orders() {
        Some(OrderSystem::start(broker, &config).await)
    } else {
        None
    };

    let mut prompt = Prompt::new();
    let mut reported = 0;
    loop {
        if let Step::Quit = step(&mut prompt, orders.as_ref(), shipments.as_ref()).await {
            break;
        }
        let mut stopped = Vec::new();
        if let Some(orders) = &orders {
            stopped.extend(orders.stopped_loops());
        }
        if let Some(shipments) = &shipments {
            stopped.extend(shipments.stopped_loops());
        }
        if stopped.len() > reported {
            warn!(?stopped, "Background loops stopped, running degraded");
            reported = stopped.len();
        }
    }

    let mut result = Ok(());
    if let Some(orders) = orders {
        result = orders.stop().await.map_err(|e| e.to_string());
    }
    if let Some(shipments) = shipments {
        result = result.and(shipments.stop().await.map_err(|e| e.to_string()));
    }
    result
}
