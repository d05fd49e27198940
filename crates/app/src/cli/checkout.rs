use clap::Args;
use storefront::{CustomerDetails, OrderError};

use crate::cli::{output, shopper::ShopperArgs};

#[derive(Debug, Args)]
pub(crate) struct CheckoutArgs {
    #[command(flatten)]
    shopper: ShopperArgs,

    #[arg(long, default_value = "")]
    first_name: String,

    #[arg(long, default_value = "")]
    last_name: String,

    #[arg(long, default_value = "")]
    phone: String,

    #[arg(long, default_value = "")]
    address: String,
}

pub(crate) async fn run(args: CheckoutArgs) -> Result<(), String> {
    let shopper = args.shopper.open().await?;
    let shop = &shopper.shop;

    let customer = CustomerDetails {
        first_name: args.first_name,
        last_name: args.last_name,
        phone: args.phone,
        address: args.address,
    };

    let order = shop
        .orders
        .checkout(&shop.cart, &customer)
        .await
        .map_err(|error| failure_message(&error))?;

    let details = shop
        .orders
        .order_details(order.uuid)
        .await
        .map_err(|error| error.user_message())?;

    println!("order placed");
    println!("{}", output::order_details(&details));

    Ok(())
}

fn failure_message(error: &OrderError) -> String {
    match error {
        OrderError::Validation(validation) => {
            let problems: Vec<String> = validation
                .problems()
                .iter()
                .filter_map(|(field, _)| validation.message(*field))
                .collect();

            format!("{}\n{}", error.user_message(), problems.join("\n"))
        }
        _ => error.user_message(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_failures_list_each_field() {
        let details = CustomerDetails {
            first_name: "Ada".to_string(),
            ..CustomerDetails::default()
        };

        let Err(validation) = details.validate() else {
            panic!("blank details should not validate");
        };

        let message = failure_message(&OrderError::from(validation));

        assert!(message.starts_with("Please fill in your customer details before checkout."));
        assert!(message.contains("Last name is required"));
        assert!(!message.contains("First name"));
    }

    #[test]
    fn other_failures_use_the_generic_message() {
        assert_eq!(failure_message(&OrderError::EmptyCart), "Your cart is empty.");
    }
}
