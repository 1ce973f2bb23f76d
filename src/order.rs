//! Order descriptor sent as `pesapal_request_data`.
#![expect(
    clippy::module_name_repetitions,
    reason = "`OrderDescriptor` and `OrderType` read ambiguously without the prefix"
)]

use bon::Builder;
use rust_decimal::Decimal;
use serde::Serialize;
use strum_macros::Display;

use crate::Result;
use crate::error::Error;

const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq)]
#[strum(serialize_all = "UPPERCASE")]
pub enum OrderType {
    #[default]
    Merchant,
    Order,
}

/// One `<LineItem/>` of the order; all fields are written as attributes.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LineItem {
    #[serde(rename = "@UniqueId")]
    pub unique_id: String,
    #[serde(rename = "@Particulars")]
    pub particulars: String,
    #[serde(rename = "@Quantity")]
    pub quantity: u32,
    #[serde(rename = "@UnitCost")]
    pub unit_cost: Decimal,
    #[serde(rename = "@SubTotal")]
    pub sub_total: Decimal,
}

impl LineItem {
    /// Builds a line item whose sub-total is `unit_cost * quantity`.
    ///
    /// Fails with [`crate::Kind::Validation`] when the sub-total does not fit a [`Decimal`].
    pub fn new<I, P>(
        unique_id: I,
        particulars: P,
        quantity: u32,
        unit_cost: Decimal,
    ) -> Result<Self>
    where
        I: Into<String>,
        P: Into<String>,
    {
        let unique_id = unique_id.into();
        let sub_total = unit_cost
            .checked_mul(Decimal::from(quantity))
            .ok_or_else(|| {
                Error::validation(format!(
                    "line item `{unique_id}` sub-total overflows: {quantity} x {unit_cost}"
                ))
            })?;

        Ok(Self {
            unique_id,
            particulars: particulars.into(),
            quantity,
            unit_cost,
            sub_total,
        })
    }
}

/// The transaction the payer is asked to pay.
#[non_exhaustive]
#[derive(Builder, Clone, Debug, PartialEq)]
pub struct OrderDescriptor {
    pub amount: Decimal,
    #[builder(into)]
    pub currency: String,
    #[builder(into)]
    pub description: String,
    #[builder(default)]
    pub order_type: OrderType,
    #[builder(into)]
    pub reference: String,
    #[builder(into, default)]
    pub first_name: String,
    #[builder(into, default)]
    pub last_name: String,
    #[builder(into, default)]
    pub email: String,
    #[builder(into, default)]
    pub phone_number: String,
    #[builder(default)]
    pub line_items: Vec<LineItem>,
    #[builder(into, default)]
    pub callback_url: String,
}

#[derive(Serialize)]
#[serde(rename = "PesapalDirectOrderInfo")]
struct DirectOrderInfo<'order> {
    #[serde(rename = "@xmlns:xsi")]
    xsi: &'static str,
    #[serde(rename = "@xmlns:xsd")]
    xsd: &'static str,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "Currency")]
    currency: &'order str,
    #[serde(rename = "Description")]
    description: &'order str,
    #[serde(rename = "Type")]
    order_type: String,
    #[serde(rename = "Reference")]
    reference: &'order str,
    #[serde(rename = "FirstName")]
    first_name: &'order str,
    #[serde(rename = "LastName")]
    last_name: &'order str,
    #[serde(rename = "Email")]
    email: &'order str,
    #[serde(rename = "PhoneNumber")]
    phone_number: &'order str,
    #[serde(rename = "LineItems")]
    line_items: LineItems<'order>,
    #[serde(rename = "CallbackURL")]
    callback_url: &'order str,
}

#[derive(Serialize)]
struct LineItems<'order> {
    #[serde(rename = "LineItem")]
    items: &'order [LineItem],
}

impl OrderDescriptor {
    /// Requires a positive amount, a currency, a reference, and a payer email or phone number.
    pub fn validate(&self) -> Result<()> {
        if self.amount <= Decimal::ZERO {
            return Err(Error::validation(format!(
                "order amount must be positive, got {}",
                self.amount
            )));
        }
        if self.currency.trim().is_empty() {
            return Err(Error::validation("order currency must not be empty"));
        }
        if self.reference.trim().is_empty() {
            return Err(Error::validation("order reference must not be empty"));
        }
        if self.email.trim().is_empty() && self.phone_number.trim().is_empty() {
            return Err(Error::validation("order needs a payer email or phone number"));
        }
        Ok(())
    }

    /// Serializes the order as a `PesapalDirectOrderInfo` document.
    pub fn to_xml(&self) -> Result<String> {
        let info = DirectOrderInfo {
            xsi: XSI_NAMESPACE,
            xsd: XSD_NAMESPACE,
            amount: self.amount.to_string(),
            currency: &self.currency,
            description: &self.description,
            order_type: self.order_type.to_string(),
            reference: &self.reference,
            first_name: &self.first_name,
            last_name: &self.last_name,
            email: &self.email,
            phone_number: &self.phone_number,
            line_items: LineItems {
                items: &self.line_items,
            },
            callback_url: &self.callback_url,
        };

        Ok(quick_xml::se::to_string(&info)?)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::error::Kind;

    fn order() -> OrderDescriptor {
        OrderDescriptor::builder()
            .amount(dec!(100))
            .currency("UGX")
            .description("Test Order")
            .reference("1")
            .first_name("John")
            .last_name("Doe")
            .email("test@example.com")
            .build()
    }

    #[test]
    fn xml_document_is_byte_exact() {
        assert_eq!(
            order().to_xml().unwrap(),
            concat!(
                r#"<PesapalDirectOrderInfo xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" "#,
                r#"xmlns:xsd="http://www.w3.org/2001/XMLSchema">"#,
                "<Amount>100</Amount>",
                "<Currency>UGX</Currency>",
                "<Description>Test Order</Description>",
                "<Type>MERCHANT</Type>",
                "<Reference>1</Reference>",
                "<FirstName>John</FirstName>",
                "<LastName>Doe</LastName>",
                "<Email>test@example.com</Email>",
                "<PhoneNumber/>",
                "<LineItems/>",
                "<CallbackURL/>",
                "</PesapalDirectOrderInfo>",
            )
        );
    }

    #[test]
    fn xml_escapes_text() {
        let order = OrderDescriptor::builder()
            .amount(dec!(12.50))
            .currency("KES")
            .description("Fish & <Chips>")
            .order_type(OrderType::Order)
            .reference("A-7")
            .phone_number("+256700000000")
            .build();
        assert!(order.validate().is_ok(), "phone number alone identifies the payer");
        let xml = order.to_xml().unwrap();

        assert!(xml.contains("<Description>Fish &amp; &lt;Chips&gt;</Description>"), "{xml}");
        assert!(xml.contains("<Amount>12.50</Amount>"));
        assert!(xml.contains("<Type>ORDER</Type>"));
    }

    #[test]
    fn line_items_are_attribute_elements() {
        let order = OrderDescriptor::builder()
            .amount(dec!(30))
            .currency("UGX")
            .description("Two items")
            .reference("2")
            .email("test@example.com")
            .line_items(vec![LineItem::new("sku-1", "Notebook", 3, dec!(10)).unwrap()])
            .build();
        let xml = order.to_xml().unwrap();

        assert!(
            xml.contains(
                r#"<LineItems><LineItem UniqueId="sku-1" Particulars="Notebook" Quantity="3" UnitCost="10" SubTotal="30"/></LineItems>"#
            ),
            "{xml}"
        );
    }

    #[test]
    fn line_item_sub_total_overflow_is_rejected() {
        let err = LineItem::new("a", "b", 2, Decimal::MAX).unwrap_err();
        assert_eq!(err.kind(), Kind::Validation);

        let item = LineItem::new("a", "b", 0, Decimal::MAX).unwrap();
        assert_eq!(item.sub_total, Decimal::ZERO);
    }

    #[test]
    fn validate_rejects_incomplete_orders() {
        assert!(order().validate().is_ok());

        let mut bad = order();
        bad.amount = dec!(0);
        assert_eq!(bad.validate().unwrap_err().kind(), Kind::Validation);

        let mut bad = order();
        bad.currency = " ".to_owned();
        assert_eq!(bad.validate().unwrap_err().kind(), Kind::Validation);

        let mut bad = order();
        bad.email.clear();
        let err = bad.validate().unwrap_err();
        assert_eq!(err.kind(), Kind::Validation);
        assert!(err.to_string().contains("email or phone"), "{err}");
    }
}
