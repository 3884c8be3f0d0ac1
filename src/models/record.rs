use serde::Serialize;

use crate::domain::record::RecordFormData;

#[derive(Debug, Serialize, PartialEq)]
/// Request body of `POST /crm/records` and `PUT /crm/records/{id}`.
///
/// Built from [`RecordFormData`] without `esteira`, which the API rejects,
/// and with `migracao` in its string wire form.
pub struct RecordPayload<'a> {
    pub uf: &'a str,
    pub ddd: &'a str,
    pub adabas: &'a str,
    pub responsavel_p_colocar_na_planilha: &'a str,
    pub data_entrega: &'a str,
    pub crm: &'a str,
    pub simulacao: &'a str,
    pub pedido: &'a str,
    pub razao_social: &'a str,
    pub cnpj: &'a str,
    pub servicos: &'a str,
    pub plano: &'a str,
    pub valor_do_plano: f64,
    pub quantidade_aparelho: u32,
    pub valor_do_aparelho: f64,
    pub qtd_sva: u32,
    pub pacote_sva: &'a str,
    pub valor_sva: f64,
    pub valor_atual: f64,
    pub valor_da_renovacao: f64,
    pub m: &'a str,
    pub migracao: &'static str,
    pub base_fresh: &'a str,
    pub qtd: u32,
    pub status: &'a str,
    pub data_do_status: &'a str,
    pub historico: &'a str,
    pub consultor: &'a str,
    pub equipe: &'a str,
}

impl<'a> From<&'a RecordFormData> for RecordPayload<'a> {
    fn from(data: &'a RecordFormData) -> Self {
        Self {
            uf: &data.uf,
            ddd: &data.ddd,
            adabas: &data.adabas,
            responsavel_p_colocar_na_planilha: &data.responsavel_p_colocar_na_planilha,
            data_entrega: &data.data_entrega,
            crm: &data.crm,
            simulacao: &data.simulacao,
            pedido: &data.pedido,
            razao_social: &data.razao_social,
            cnpj: &data.cnpj,
            servicos: &data.servicos,
            plano: &data.plano,
            valor_do_plano: data.valor_do_plano,
            quantidade_aparelho: data.quantidade_aparelho,
            valor_do_aparelho: data.valor_do_aparelho,
            qtd_sva: data.qtd_sva,
            pacote_sva: &data.pacote_sva,
            valor_sva: data.valor_sva,
            valor_atual: data.valor_atual,
            valor_da_renovacao: data.valor_da_renovacao,
            m: &data.m,
            migracao: data.migracao.encode(),
            base_fresh: &data.base_fresh,
            qtd: data.qtd,
            status: &data.status,
            data_do_status: &data.data_do_status,
            historico: &data.historico,
            consultor: &data.consultor,
            equipe: &data.equipe,
        }
    }
}
