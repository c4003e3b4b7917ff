use mems_bsp::{init_tracing, run_data_logger};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    init_tracing();

    // Get config path (board default or override)
    let config_path = mems_bsp_x_nucleo_iks4a1::get_config_path();

    tracing::info!(
        "[{}] Configuration path: {}",
        mems_bsp_x_nucleo_iks4a1::BOARD_NAME,
        config_path
    );

    // Run the data logger
    run_data_logger(&config_path).await
}
